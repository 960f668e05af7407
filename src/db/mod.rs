use mongodb::{Client, Database, IndexModel};
use mongodb::bson::doc;
use rocket::fairing::AdHoc;

use crate::models::Review;

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok(database) => {
                info!("✓ MongoDB connected successfully");
                rocket.manage(database)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<Database, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1}, None)
        .await?;

    let database = client.database("quickserve");

    // The aggregator re-scans all reviews of one restaurant on every
    // submission; index the foreign key so that scan is not a full
    // collection scan.
    database
        .collection::<Review>("reviews")
        .create_index(
            IndexModel::builder().keys(doc! { "restaurant_id": 1 }).build(),
            None,
        )
        .await?;

    Ok(database)
}

pub type DbConn = Database;
