use super::*;

#[test]
fn test_empty_toml_gives_defaults() {
    let config = AgentConfig::from_toml_str("").unwrap();
    assert_eq!(config, AgentConfig::default());
    assert_eq!(config.sampling.max_sampled_boards, 100);
    assert_eq!(config.sensing.opening_plies, 4);
    assert_eq!(config.opening_move.as_deref(), Some("e2e4"));
}

#[test]
fn test_partial_toml_overrides_only_named_keys() {
    let config = AgentConfig::from_toml_str(
        r#"
        seed = 42

        [engine]
        path = "/opt/stockfish/stockfish"
        threads = 1

        [sampling]
        max_sampled_boards = 20
        "#,
    )
    .unwrap();
    assert_eq!(config.seed, Some(42));
    assert_eq!(
        config.engine.resolve_path(),
        PathBuf::from("/opt/stockfish/stockfish")
    );
    assert_eq!(config.engine.threads, 1);
    assert_eq!(config.engine.hash_mb, 128);
    assert_eq!(config.sampling.max_sampled_boards, 20);
    assert_eq!(config.sampling.vote_top_k, 3);
}

#[test]
fn test_invalid_values_rejected() {
    let err = AgentConfig::from_toml_str("[sampling]\nknown_king_share = 1.5\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = AgentConfig::from_toml_str("opening_move = \"castle\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = AgentConfig::from_toml_str("[sampling]\nmax_sampled_boards = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_non_finite_query_times_rejected() {
    for toml in [
        "[sampling]\nmin_query_secs = nan\n",
        "[sampling]\nmax_query_secs = nan\n",
        "[sampling]\nmax_query_secs = inf\n",
        "[sampling]\nvote_budget_secs = nan\n",
        "[sampling]\nmax_query_secs = 1e300\n",
    ] {
        let err = AgentConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{toml}");
    }
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let err = AgentConfig::from_toml_str("seed = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_query_time_shrinks_with_sample_size() {
    let policy = SamplingPolicy::default();
    let clock = Duration::from_secs(900);
    // 5s over 10 members would be 0.5s, capped at the 50ms ceiling.
    assert_eq!(policy.query_time(10, clock), Duration::from_secs_f64(0.05));
    // 5s over 1000 members is 5ms.
    assert_eq!(policy.query_time(1000, clock), Duration::from_secs_f64(0.005));
    // Never below the floor.
    assert_eq!(
        policy.query_time(1_000_000, clock),
        Duration::from_secs_f64(0.001)
    );
}

#[test]
fn test_query_time_respects_low_clock() {
    let policy = SamplingPolicy::default();
    // 2s left: budget 0.2s over 100 members is 2ms.
    assert_eq!(
        policy.query_time(100, Duration::from_secs(2)),
        Duration::from_secs_f64(0.002)
    );
}
