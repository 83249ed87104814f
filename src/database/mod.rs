use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool otimizado
        client_options.max_pool_size = Some(20);  // Max 20 conexões simultâneas
        client_options.min_pool_size = Some(5);   // Mantém 5 conexões sempre vivas
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));  // 5min idle

        // Timeouts otimizados
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .unwrap_or("CharmCards");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates necessary indexes for optimal query performance
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        // users(email) UNIQUE - garante o 409 em registro duplicado
        let users = self.database().collection::<mongodb::bson::Document>("users");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // users(agility) - fan-out de notificações busca admins por role
        let agility_index = IndexModel::builder()
            .keys(doc! { "agility": 1 })
            .build();

        match users.create_index(agility_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(agility)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // vcards(user_id) - listagem de cartões do usuário e cascade delete
        let vcards = self.database().collection::<mongodb::bson::Document>("vcards");

        let vcards_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .build();

        match vcards.create_index(vcards_index).await {
            Ok(_) => log::info!("   ✅ Index created: vcards(user_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // scan_logs(card_id) e scan_logs(user_id) - histórico e contagens
        let scan_logs = self.database().collection::<mongodb::bson::Document>("scan_logs");

        let scans_card_index = IndexModel::builder()
            .keys(doc! { "card_id": 1 })
            .build();

        match scan_logs.create_index(scans_card_index).await {
            Ok(_) => log::info!("   ✅ Index created: scan_logs(card_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let scans_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .build();

        match scan_logs.create_index(scans_user_index).await {
            Ok(_) => log::info!("   ✅ Index created: scan_logs(user_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // notifications(user_id, is_read) e (user_id, created_at) - inbox
        let notifications = self
            .database()
            .collection::<mongodb::bson::Document>("notifications");

        let notif_read_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "is_read": 1 })
            .build();

        match notifications.create_index(notif_read_index).await {
            Ok(_) => log::info!("   ✅ Index created: notifications(user_id, is_read)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let notif_created_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .build();

        match notifications.create_index(notif_created_index).await {
            Ok(_) => log::info!("   ✅ Index created: notifications(user_id, created_at)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
