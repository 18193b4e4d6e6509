//! In-Memory Retriever
//!
//! A backend requiring no external service: a small fixed corpus of
//! sample meal-planning documents tagged with the caller's scope. Ranking
//! is naive term overlap, which is enough to exercise the pipeline
//! end-to-end with no real search backend behind it.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;

use sous::{DocumentRetriever, DomainError, RetrievedDocument, ScopedFilter};

/// Sample corpus seeded for every scope.
const SEED_DOCUMENTS: &[(&str, &str)] = &[
    (
        "seed-weeknight-stirfry",
        "Weeknight vegetable stir-fry: broccoli, bell pepper, and tofu over rice. \
         Ready in 20 minutes, keeps well for lunch the next day.",
    ),
    (
        "seed-batch-chili",
        "Batch-cook bean chili for meal prep: one pot makes six servings. \
         Freezes well; pair with cornbread or rice.",
    ),
    (
        "seed-salmon-sheetpan",
        "Sheet-pan salmon with roasted potatoes and asparagus. \
         High protein, about 30 minutes end to end.",
    ),
    (
        "seed-pantry-staples",
        "Pantry staples checklist: olive oil, canned tomatoes, dried pasta, \
         rice, lentils, stock cubes, and frozen vegetables.",
    ),
    (
        "seed-breakfast-oats",
        "Overnight oats three ways: berry, peanut butter banana, and apple \
         cinnamon. Assemble five jars on Sunday for the week.",
    ),
    (
        "seed-grocery-plan",
        "Weekly grocery planning: build the list from the week's dinners \
         first, then add breakfasts, lunches, and snacks.",
    ),
];

/// Document retriever over an in-memory corpus
pub struct MemoryRetriever {
    filter: ScopedFilter,
    documents: Vec<RetrievedDocument>,
}

impl MemoryRetriever {
    /// The default corpus, tagged with the caller's `{user_id, env}` so
    /// the same scoping semantics hold as with a real backend.
    pub fn seeded(filter: ScopedFilter) -> Self {
        let documents = SEED_DOCUMENTS
            .iter()
            .map(|(id, content)| RetrievedDocument {
                id: (*id).to_string(),
                content: (*content).to_string(),
                score: 0.0,
                metadata: json!({
                    "user_id": filter.user_id,
                    "env": filter.env.to_string(),
                }),
            })
            .collect();
        Self { filter, documents }
    }

    /// A custom corpus; used by tests to prove cross-scope exclusion.
    pub fn with_documents(filter: ScopedFilter, documents: Vec<RetrievedDocument>) -> Self {
        Self { filter, documents }
    }

    fn terms(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(|t| t.to_string())
            .collect()
    }

    fn overlap_score(query_terms: &HashSet<String>, content: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let doc_terms = Self::terms(content);
        let shared = query_terms.intersection(&doc_terms).count();
        shared as f32 / query_terms.len() as f32
    }
}

#[async_trait]
impl DocumentRetriever for MemoryRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, DomainError> {
        let query_terms = Self::terms(query);

        let mut scored: Vec<RetrievedDocument> = self
            .documents
            .iter()
            .filter(|doc| self.filter.matches(&doc.metadata))
            .map(|doc| {
                let mut doc = doc.clone();
                doc.score = Self::overlap_score(&query_terms, &doc.content);
                doc
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sous::Environment;

    fn doc(id: &str, content: &str, user_id: &str, env: &str) -> RetrievedDocument {
        RetrievedDocument {
            id: id.to_string(),
            content: content.to_string(),
            score: 0.0,
            metadata: json!({ "user_id": user_id, "env": env }),
        }
    }

    #[tokio::test]
    async fn test_search_ranks_by_term_overlap() {
        let filter = ScopedFilter::new("user-1", Environment::Development);
        let retriever = MemoryRetriever::seeded(filter);

        let results = retriever.search("salmon sheet-pan dinner", 3).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].id, "seed-salmon-sheetpan");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_search_never_returns_other_scopes() {
        let filter = ScopedFilter::new("user-1", Environment::Development);
        let retriever = MemoryRetriever::with_documents(
            filter,
            vec![
                doc("mine", "chili recipe", "user-1", "development"),
                doc("other-user", "chili recipe", "user-2", "development"),
                doc("other-env", "chili recipe", "user-1", "production"),
            ],
        );

        let results = retriever.search("chili recipe", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "mine");
    }

    #[tokio::test]
    async fn test_k_bounds_results() {
        let filter = ScopedFilter::new("user-1", Environment::Development);
        let retriever = MemoryRetriever::seeded(filter);

        let results = retriever.search("meal plan for the week", 2).await.unwrap();
        assert!(results.len() <= 2);
    }
}
