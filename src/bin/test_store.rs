use wallet_aggregator::db::{connection, StoreSession};
use wallet_aggregator::models::{ProviderId, StoredAddress};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:wallets.db".to_string());

    // Set up database connection
    println!("Establishing database connection...");
    let pool = connection::establish_connection(&database_url).await?;
    println!("✅ Database connection established!");

    let wallet = format!("0xtest{}", chrono::Utc::now().timestamp());
    let address = StoredAddress {
        address: "0x0000000000000000000000000000000000000001".to_string(),
        has_content: true,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    // Write the same address twice; the second upsert must be a no-op
    let mut session = StoreSession::begin(&pool).await?;
    let wallet_id = session.ensure_wallet(&wallet).await?;
    let first = session.upsert_addresses(wallet_id, ProviderId::One, &[address.clone()]).await?;
    let second = session.upsert_addresses(wallet_id, ProviderId::One, &[address]).await?;
    session.commit().await?;
    println!("✅ Inserted {} then {} rows for wallet {}", first, second, wallet);

    if second != 0 {
        println!("❌ ERROR: duplicate address row written!");
        return Err("Idempotent upsert check failed".into());
    }

    // Read it back
    let mut session = StoreSession::begin(&pool).await?;
    let data = session.load_saved_data(&wallet).await?;
    session.commit().await?;

    for id in ProviderId::ALL {
        println!("  source {}: {} addresses", id.as_str(), data.addresses_for(id).len());
    }
    println!("  transactions: {}", data.transactions.len());

    println!("All tests completed successfully!");
    Ok(())
}
