use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Database};
use tokio::sync::OnceCell;
use tracing::info;

use super::{LogEntry, LogStore};
use crate::config::MigrateConfig;
use crate::error::{Error, Result};
use crate::metrics::time_store_operation;

const APP_NAME: &str = "mongo-migrate";
const FALLBACK_DATABASE: &str = "test";

/// Log store backed by a MongoDB collection.
///
/// One client is opened on first use and reused by every later call until
/// [`LogStore::close`] shuts it down.
pub struct MongoLogStore {
    store_url: String,
    database_name: Option<String>,
    collection_name: String,
    connect_timeout: std::time::Duration,
    client: OnceCell<Client>,
}

impl MongoLogStore {
    pub fn new(config: &MigrateConfig) -> Self {
        Self {
            store_url: config.store_url.clone(),
            database_name: config.database_name.clone(),
            collection_name: config.collection_name.clone(),
            connect_timeout: config.connect_timeout,
            client: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<&Client> {
        self.client.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<Client> {
        let mut client_options = ClientOptions::parse(&self.store_url)
            .await
            .map_err(|e| Error::Persistence(format!("failed to parse store url: {e}")))?;
        client_options.app_name = Some(APP_NAME.to_string());
        client_options.connect_timeout = Some(self.connect_timeout);
        client_options.server_selection_timeout = Some(self.connect_timeout);

        let client = Client::with_options(client_options)
            .map_err(|e| Error::Persistence(format!("failed to create client: {e}")))?;
        let db = self.database_for(&client);
        db.run_command(doc! {"ping": 1}, None)
            .await
            .map_err(|e| Error::Persistence(format!("failed to connect: {e}")))?;
        info!(database = %db.name(), collection = %self.collection_name, "Connected to MongoDB");
        Ok(client)
    }

    fn database_for(&self, client: &Client) -> Database {
        match &self.database_name {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(FALLBACK_DATABASE)),
        }
    }

    async fn collection(&self) -> Result<Collection<LogEntry>> {
        let client = self.client().await?;
        Ok(self
            .database_for(client)
            .collection::<LogEntry>(&self.collection_name))
    }
}

#[async_trait::async_trait]
impl LogStore for MongoLogStore {
    type Db = Database;

    async fn db(&self) -> Result<Database> {
        let client = self.client().await?;
        Ok(self.database_for(client))
    }

    async fn find_all(&self) -> Result<Vec<LogEntry>> {
        let collection = self.collection().await?;
        time_store_operation("find", &self.collection_name, async {
            let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
            let cursor = collection.find(None, options).await?;
            cursor.try_collect::<Vec<_>>().await
        })
        .await
        .map_err(|e| Error::Persistence(format!("failed to read log entries: {e}")))
    }

    async fn insert(&self, entry: LogEntry) -> Result<()> {
        let collection = self.collection().await?;
        time_store_operation("insert", &self.collection_name, async {
            collection.insert_one(&entry, None).await
        })
        .await
        .map_err(|e| {
            Error::Persistence(format!("failed to insert log entry {}: {e}", entry.name))
        })?;
        Ok(())
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        let collection = self.collection().await?;
        time_store_operation("delete", &self.collection_name, async {
            collection.delete_one(doc! {"name": name}, None).await
        })
        .await
        .map_err(|e| Error::Persistence(format!("failed to delete log entry {name}: {e}")))?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        if let Some(client) = self.client.into_inner() {
            client.shutdown().await;
            info!("MongoDB client shut down");
        }
        Ok(())
    }
}
