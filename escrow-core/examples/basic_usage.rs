use escrow_core::{
    Amount, ClientConfig, EntityStore, EscrowClient, MockWallet, PayoutCredential, Secret, Storage,
};
use std::sync::Arc;
use tempfile::tempdir;

const PASSWORD: &str = "correct horse battery";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let temp_dir = tempdir()?;
    println!("Using temporary directory: {:?}", temp_dir.path());

    let storage = Storage::new(&temp_dir.path().join("escrow.db")).await?;
    let store = Arc::new(EntityStore::load_from(&storage).await?);
    let wallet = Arc::new(MockWallet::new());
    let client = EscrowClient::new(store.clone(), wallet, ClientConfig::default())?;

    let alice = client.new_player("alice", Secret::new(PASSWORD)).await?;
    let bob = client.new_player("bob", Secret::new(PASSWORD)).await?;
    client.select_player(&alice.id)?;

    let contract = client
        .new_contract(&alice.id, &bob.id, Amount::from_sat(100_000), "")
        .await?;
    let id = contract.id.clone();
    println!("\nContract {}: {}", id, client.status(&id)?);

    client.sign_contract(&id, Secret::new(PASSWORD)).await?;
    println!("alice signed: {}", client.status(&id)?);

    client.select_player(&bob.id)?;
    println!("bob sees: {}", client.status(&id)?);
    client.sign_contract(&id, Secret::new(PASSWORD)).await?;
    client.arbiter_sign_contract(&id).await?;
    client.broadcast_funding_tx(&id).await?;
    client.confirm_funding_tx(&id).await?;
    println!("funded: {}", client.status(&id)?);

    client
        .new_payout(&id, Amount::from_sat(25_000), Amount::from_sat(75_000))
        .await?;
    client
        .sign_payout(&id, PayoutCredential::Token(Secret::new("oracle-token")))
        .await?;
    println!("bob signed payout with token: {}", client.status(&id)?);

    client.arbiter_sign_payout(&id).await?;
    client.broadcast_payout_tx(&id).await?;
    client.confirm_payout_tx(&id).await?;
    println!("final: {}", client.status(&id)?);

    store.persist_to(&storage).await?;
    println!("\nExample completed successfully!");

    Ok(())
}
