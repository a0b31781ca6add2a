// Property-based tests for object rate limiting.
//
// For any accepted rate limit, the value reaches the Config unchanged, and
// the token bucket built from it never allows more than that many objects up
// front nor refills by less than one token per interval.

#[cfg(test)]
mod tests {
    use crate::config::args::parse_from_args;
    use crate::config::{CLITimeoutConfig, ClientConfig, Config};
    use crate::storage::{build_rate_limiter, create_storage};
    use crate::test_utils::{init_dummy_tracing_subscriber, make_test_config};
    use crate::types::{ClientConfigLocation, S3Credentials};

    use aws_smithy_types::checksum_config::RequestChecksumCalculation;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    fn make_test_client_config() -> ClientConfig {
        ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: None,
                aws_shared_credentials_file: None,
            },
            credential: S3Credentials::FromEnvironment,
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("https://localhost:9000".to_string()),
            force_path_style: true,
            accelerate: false,
            cli_timeout_config: CLITimeoutConfig::default(),
            disable_stalled_stream_protection: false,
            request_checksum_calculation: RequestChecksumCalculation::WhenRequired,
        }
    }

    fn base_args(rate_limit: Option<&str>) -> Vec<&str> {
        let mut args = vec![
            "s3redirect",
            "s3://test-bucket/www",
            "--build-root",
            ".",
            "--redirects",
            "https://example.com/redirects.json",
        ];
        if let Some(rate_limit) = rate_limit {
            args.push("--rate-limit-objects");
            args.push(rate_limit);
        }
        args
    }

    fn arb_rate_limit() -> impl Strategy<Value = u32> {
        1u32..=100_000
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_rate_limit_cli_propagation(rate_limit in arb_rate_limit()) {
            let rate_str = rate_limit.to_string();

            let cli = parse_from_args(base_args(Some(&rate_str))).unwrap();
            let config = Config::try_from(cli).unwrap();

            prop_assert_eq!(config.rate_limit_objects, Some(rate_limit));
        }

        #[test]
        fn prop_rate_limiter_shape(rate_limit in arb_rate_limit()) {
            let rate_limiter = build_rate_limiter(rate_limit);

            prop_assert_eq!(rate_limiter.max(), rate_limit as usize);
            prop_assert!(rate_limiter.refill() >= 1);
            prop_assert!(rate_limiter.refill() <= rate_limiter.max());
            if rate_limit > 10 {
                prop_assert_eq!(rate_limiter.refill(), rate_limit as usize / 10);
            }
        }

        #[test]
        fn prop_rate_limit_storage_creation(rate_limit in arb_rate_limit()) {
            init_dummy_tracing_subscriber();

            let mut config = make_test_config();
            config.target_client_config = Some(make_test_client_config());
            config.rate_limit_objects = Some(rate_limit);

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async {
                let (stats_sender, _stats_receiver) = async_channel::unbounded();
                let has_warning = Arc::new(AtomicBool::new(false));

                let storage = create_storage(config, stats_sender, has_warning).await;
                prop_assert!(
                    storage.is_ok(),
                    "storage must be created with rate_limit_objects={}",
                    rate_limit
                );

                Ok(())
            })?;
        }
    }

    #[test]
    fn rate_limit_default_none() {
        let config = Config::try_from(parse_from_args(base_args(None)).unwrap()).unwrap();
        assert!(config.rate_limit_objects.is_none());
    }

    #[test]
    fn rate_limit_zero_is_rejected() {
        let cli = parse_from_args(base_args(Some("0"))).unwrap();
        assert!(Config::try_from(cli).is_err());
    }

    #[tokio::test]
    async fn rate_limiter_hands_out_initial_tokens_immediately() {
        let rate_limiter = build_rate_limiter(5);
        for _ in 0..5 {
            assert!(rate_limiter.try_acquire(1));
        }
        assert!(!rate_limiter.try_acquire(1));
    }
}
