//! Whole-suite runs through the capability-detected driver.

#[cfg(test)]
mod tests {
    use polystore_conformance::run_all;

    use crate::{seeded_fixtures, store};

    #[tokio::test]
    async fn test_should_pass_full_suite() {
        let store = store();
        let fx = seeded_fixtures(0x5eed);
        run_all(store.as_ref(), &fx)
            .await
            .unwrap_or_else(|e| panic!("conformance suite failed: {e}"));
    }

    #[tokio::test]
    async fn test_should_pass_full_suite_twice_on_one_backend() {
        // Checks clean up after themselves, so a shared backend passes a
        // second run.
        let store = store();
        let fx = seeded_fixtures(7);
        for round in 0..2 {
            run_all(store.as_ref(), &fx)
                .await
                .unwrap_or_else(|e| panic!("suite round {round} failed: {e}"));
        }
    }

    #[tokio::test]
    async fn test_should_pass_concurrent_suites_on_one_backend() {
        // Unique fixture paths keep concurrent runs on distinct paths.
        let store = store();
        let a = tokio::spawn({
            let store = store.clone();
            async move {
                run_all(store.as_ref(), &seeded_fixtures(1))
                    .await
                    .unwrap_or_else(|e| panic!("suite run failed: {e}"));
            }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move {
                run_all(store.as_ref(), &seeded_fixtures(2))
                    .await
                    .unwrap_or_else(|e| panic!("suite run failed: {e}"));
            }
        });
        a.await.unwrap_or_else(|e| panic!("suite a failed: {e}"));
        b.await.unwrap_or_else(|e| panic!("suite b failed: {e}"));
    }
}
