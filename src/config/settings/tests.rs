use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.openai.base_url, "https://api.openai.com");
    assert_eq!(config.openai.embedding_model, "text-embedding-ada-002");
    assert_eq!(config.openai.chat_model, "gpt-4");
    assert_eq!(config.pinecone.index_name, "product-recommendations");
    assert_eq!(config.pinecone.dimension, 1536);
    assert_eq!(config.pinecone.metric, Metric::Cosine);
    assert_eq!(config.recommend.top_k, 10);
    assert!(config.validate().is_ok());
}

#[test]
fn config_validation() {
    let config = Config::default();

    let mut invalid_config = config.clone();
    invalid_config.openai.base_url = "ftp://example.com".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.openai.embedding_model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.pinecone.index_name = "Products".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.pinecone.dimension = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.pinecone.cloud = "moon".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.recommend.top_k = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.recommend.ingest_concurrency = 65;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.timeout_seconds = 0;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn index_name_rules() {
    assert!(validate_index_name("product-recommendations").is_ok());
    assert!(validate_index_name("shop2").is_ok());
    assert!(validate_index_name("").is_err());
    assert!(validate_index_name("-leading").is_err());
    assert!(validate_index_name("trailing-").is_err());
    assert!(validate_index_name("under_score").is_err());
    assert!(validate_index_name(&"a".repeat(46)).is_err());
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let mut parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    parsed_config.base_dir = config.base_dir.clone();
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let toml_str = r#"
        [pinecone]
        index_name = "shop"
        metric = "dotproduct"

        [recommend]
        top_k = 3
    "#;
    let config: Config = toml::from_str(toml_str).expect("should parse partial toml");

    assert_eq!(config.pinecone.index_name, "shop");
    assert_eq!(config.pinecone.metric, Metric::Dotproduct);
    assert_eq!(config.pinecone.dimension, 1536);
    assert_eq!(config.recommend.top_k, 3);
    assert_eq!(config.recommend.ingest_concurrency, 4);
    assert_eq!(config.openai.chat_model, "gpt-4");
    assert_eq!(config.timeout_seconds, 30);
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("missing file should load defaults");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.pinecone, PineconeConfig::default());
}

#[test]
fn save_then_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config::load(temp_dir.path()).expect("should load defaults");
    config.recommend.top_k = 5;
    config.pinecone.cloud = "gcp".to_string();

    config.save().expect("should save config");
    assert!(config.config_file_path().exists());

    let loaded = Config::load(temp_dir.path()).expect("should load saved config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[recommend]\ntop_k = 0\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn invalid_toml_handling() {
    let invalid_toml = r#"
        [pinecone
        index_name = "shop"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}

#[test]
fn setter_validation() {
    let mut config = Config::default();

    assert!(config.openai.set_base_url("http://localhost:8080".to_string()).is_ok());
    assert!(config.openai.set_embedding_model("text-embedding-3-small".to_string()).is_ok());
    assert!(config.openai.set_chat_model("gpt-4o-mini".to_string()).is_ok());
    assert!(config.pinecone.set_index_name("catalog".to_string()).is_ok());
    assert!(config.pinecone.set_dimension(768).is_ok());
    assert!(config.pinecone.set_cloud("azure".to_string()).is_ok());
    assert!(config.recommend.set_top_k(25).is_ok());
    assert!(config.recommend.set_ingest_concurrency(8).is_ok());

    assert!(config.openai.set_base_url("not a url".to_string()).is_err());
    assert!(config.openai.set_chat_model("  ".to_string()).is_err());
    assert!(config.pinecone.set_index_name("Bad Name".to_string()).is_err());
    assert!(config.pinecone.set_dimension(0).is_err());
    assert!(config.pinecone.set_cloud("ibm".to_string()).is_err());
    assert!(config.recommend.set_top_k(0).is_err());
    assert!(config.recommend.set_ingest_concurrency(0).is_err());

    assert_eq!(config.pinecone.index_name, "catalog");
    assert_eq!(config.recommend.top_k, 25);
}
