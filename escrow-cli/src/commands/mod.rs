pub mod contract;
pub mod payout;
pub mod player;

pub use contract::{handle_contract_command, ContractCommands};
pub use payout::{handle_payout_command, PayoutCommands};
pub use player::{handle_player_command, PlayerCommands};

use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Password;
use escrow_core::{
    contract_status, ContractId, EscrowClient, EscrowError, MockWallet, Player, PlayerId, Result,
    Secret,
};

pub type Client = EscrowClient<MockWallet>;

pub fn prompt_password(prompt: &str) -> Result<Secret> {
    let raw = Password::new().with_prompt(prompt).interact()?;
    Ok(Secret::new(raw))
}

pub fn prompt_new_password() -> Result<Secret> {
    let raw = Password::new()
        .with_prompt("Choose a passphrase")
        .with_confirmation("Confirm passphrase", "Passphrases do not match")
        .interact()?;
    Ok(Secret::new(raw))
}

pub fn player_by_name(client: &Client, name: &str) -> Result<Player> {
    client
        .store()
        .player_by_name(name)
        .ok_or_else(|| EscrowError::PlayerNotFound(PlayerId::new(name)))
}

pub fn player_name(client: &Client, id: &PlayerId) -> String {
    client
        .store()
        .player(id)
        .map(|p| p.name)
        .unwrap_or_else(|| format!("<unknown {}>", id))
}

/// Resolves a full contract id or a unique prefix of one.
pub fn resolve_contract(client: &Client, prefix: &str) -> Result<ContractId> {
    let matches: Vec<ContractId> = client
        .store()
        .contracts()
        .into_iter()
        .map(|c| c.id)
        .filter(|id| id.as_str().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [id] => Ok(id.clone()),
        [] => Err(EscrowError::ContractNotFound(ContractId::new(prefix))),
        _ => Err(EscrowError::invalid_state(format!(
            "contract id prefix '{}' is ambiguous ({} matches)",
            prefix,
            matches.len()
        ))),
    }
}

pub fn short_id(id: &ContractId) -> &str {
    id.as_str().get(..12).unwrap_or(id.as_str())
}

/// Lists every contract with its status and the next action for the local
/// player.
pub fn show_status(client: &Client) -> Result<()> {
    let local = client.local_player()?;
    let contracts = client.store().contracts();

    println!("Contracts for {}:", player_name(client, &local));
    if contracts.is_empty() {
        println!("No contracts found.");
        println!("Create one with: escrow contract new <player-one> <player-two> <sats>");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Player One", "Player Two", "Pot (sats)", "Status", "Next"]);

    for contract in contracts {
        let status = contract_status(&contract, &local, client.store());
        table.add_row(vec![
            short_id(&contract.id).to_string(),
            player_name(client, &contract.player_one),
            player_name(client, &contract.player_two),
            contract.amount.to_sat().to_string(),
            status.to_string(),
            status.next_action().to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}
