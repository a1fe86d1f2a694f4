use clap::Parser;
use entity_client::core::Storage;
use entity_client::utils::output::{render_records, render_value};
use entity_client::utils::logger;
use entity_client::{
    CliConfig, Command, EntityClient, EntityError, ListQuery, LocalStorage, OutputFormat, Result,
};
use serde_json::Value;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("Starting entity-client");

    if let Err(e) = run(&config).await {
        tracing::error!("❌ Command failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(config: &CliConfig) -> Result<()> {
    let resolved = match config.resolve() {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            return Err(e);
        }
    };
    let storage = LocalStorage::default();
    let client = EntityClient::new(&resolved.settings)?;

    let rendered = execute(&client, &storage, &config.command, resolved.format).await?;

    match &config.output {
        Some(path) => {
            storage.write_file(path, rendered.as_bytes()).await?;
            tracing::info!("📁 Output saved to: {}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn execute(
    client: &EntityClient,
    storage: &LocalStorage,
    command: &Command,
    format: OutputFormat,
) -> Result<String> {
    match command {
        Command::List {
            entity,
            sort,
            limit,
        } => {
            let query = list_query(sort.clone(), *limit);
            let records = client.entity(entity)?.list(&query).await?;
            render_records(&records, format)
        }
        Command::Filter {
            entity,
            query,
            sort,
            limit,
        } => {
            let conditions = json_arg(storage, query).await?;
            let records = client
                .entity(entity)?
                .filter(&conditions, &list_query(sort.clone(), *limit))
                .await?;
            render_records(&records, format)
        }
        Command::Get { entity, id } => {
            let record = client.entity(entity)?.get(id).await?;
            render_value(&serde_json::to_value(record)?, format)
        }
        Command::Create { entity, data } => {
            let body = json_arg(storage, data).await?;
            let record = client.entity(entity)?.create(&body).await?;
            render_value(&serde_json::to_value(record)?, format)
        }
        Command::Update { entity, id, data } => {
            let patch = json_arg(storage, data).await?;
            let record = client.entity(entity)?.update(id, &patch).await?;
            render_value(&serde_json::to_value(record)?, format)
        }
        Command::Delete { entity, id } => {
            let body = client.entity(entity)?.delete(id).await?;
            render_value(&body, format)
        }
        Command::BulkCreate { entity, data } => {
            let records = match json_arg(storage, data).await? {
                Value::Array(items) => items,
                _ => {
                    return Err(EntityError::InvalidConfigValueError {
                        field: "data".to_string(),
                        value: data.clone(),
                        reason: "bulk-create expects a JSON array".to_string(),
                    })
                }
            };
            let created = client.entity(entity)?.bulk_create(records).await?;
            tracing::info!("✅ Created {} {} records", created.len(), entity);
            render_records(&created, format)
        }
        Command::Upload { path } => {
            let uploaded = client.upload_path(storage, path).await?;
            render_value(&serde_json::to_value(uploaded)?, format)
        }
        Command::Extract { file_url, schema } => {
            let schema = json_arg(storage, schema).await?;
            let result = client.extract_data(file_url, &schema).await?;
            render_value(&serde_json::to_value(result)?, format)
        }
    }
}

fn list_query(sort: Option<entity_client::SortOrder>, limit: Option<usize>) -> ListQuery {
    ListQuery { sort, limit }
}

/// Inline JSON, or `@path` to read it from a file.
async fn json_arg(storage: &LocalStorage, raw: &str) -> Result<Value> {
    match raw.strip_prefix('@') {
        Some(path) => {
            let bytes = storage.read_file(path).await?;
            Ok(serde_json::from_slice(&bytes)?)
        }
        None => Ok(serde_json::from_str(raw)?),
    }
}
