//! Cache key layout shared by every cache adapter

#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    /// Key of a tagged specification result for one entity kind.
    pub fn specification(kind: &str, tag: &str) -> String {
        format!("spec:v1:{kind}:{tag}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specification_key_is_scoped_by_kind() {
        assert_eq!(
            CacheKeys::specification("related_term", "AllRelatedTermsWithTerm"),
            "spec:v1:related_term:AllRelatedTermsWithTerm"
        );
        assert_ne!(
            CacheKeys::specification("term", "All"),
            CacheKeys::specification("article", "All")
        );
    }
}
