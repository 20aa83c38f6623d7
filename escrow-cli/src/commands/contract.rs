use crate::commands::{
    player_by_name, player_name, prompt_password, resolve_contract, short_id, Client,
};
use clap::Subcommand;
use dialoguer::Confirm;
use escrow_core::{Amount, ContractStatus, Result};

#[derive(Subcommand)]
pub enum ContractCommands {
    /// Create a new contract between two players
    New {
        /// Player one name
        player_one: String,
        /// Player two name
        player_two: String,
        /// Pot in satoshis
        amount: u64,
        /// Free-form description of the wager
        #[arg(long)]
        desc: Option<String>,
    },
    /// Show contract details
    Show {
        /// Contract ID (or unique prefix)
        id: String,
    },
    /// Sign a contract as the local player (issue or accept)
    Sign {
        /// Contract ID (or unique prefix)
        id: String,
    },
    /// Decline a received contract
    Decline {
        /// Contract ID (or unique prefix)
        id: String,
    },
    /// Send a contract signed by both players to the arbiter
    Submit {
        /// Contract ID (or unique prefix)
        id: String,
    },
    /// Broadcast the funding transaction of a certified contract
    Broadcast {
        /// Contract ID (or unique prefix)
        id: String,
    },
    /// Mark the funding transaction as confirmed
    Confirm {
        /// Contract ID (or unique prefix)
        id: String,
    },
    /// Remove a contract
    Dismiss {
        /// Contract ID (or unique prefix)
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_contract_command(cmd: ContractCommands, client: &Client) -> Result<()> {
    match cmd {
        ContractCommands::New {
            player_one,
            player_two,
            amount,
            desc,
        } => {
            let p1 = player_by_name(client, &player_one)?;
            let p2 = player_by_name(client, &player_two)?;
            let contract = client
                .new_contract(
                    &p1.id,
                    &p2.id,
                    Amount::from_sat(amount),
                    desc.as_deref().unwrap_or_default(),
                )
                .await?;

            println!("Created contract {}", contract.id);
            println!("  {} vs {} for {} sats", p1.name, p2.name, amount);
            println!("Sign it with: escrow contract sign {}", short_id(&contract.id));
        }

        ContractCommands::Show { id } => {
            let id = resolve_contract(client, &id)?;
            let contract = client.contract(&id)?;
            let status = client.status(&id)?;

            println!("Contract {}", contract.id);
            println!("  Player One: {}", player_name(client, &contract.player_one));
            println!("  Player Two: {}", player_name(client, &contract.player_two));
            println!(
                "  Pot: {} sats ({:.8} BTC)",
                contract.amount.to_sat(),
                contract.amount.to_btc()
            );
            if !contract.desc.is_empty() {
                println!("  Description: {}", contract.desc);
            }
            println!(
                "  Signatures: p1={} p2={} arbiter={}",
                contract.sigs.player_one, contract.sigs.player_two, contract.sigs.arbiter
            );
            println!("  Funding tx: {}", contract.funding_tx.as_str());
            println!("  Created: {}", contract.created_at.format("%Y-%m-%d %H:%M:%S"));

            if let Some(payout) = client.store().payout_by_contract_id(&id) {
                println!("  Payout:");
                println!("    Player One: {} sats", payout.p1_amount.to_sat());
                println!("    Player Two: {} sats", payout.p2_amount.to_sat());
                println!(
                    "    Signatures: p1={} p2={} arbiter={} token={}",
                    payout.sigs.player_one,
                    payout.sigs.player_two,
                    payout.sigs.arbiter,
                    payout.payout_token
                );
                println!("    Payout tx: {}", payout.payout_tx.as_str());
            }

            println!("Status: {}", status);
            println!("Next: {}", status.next_action());
        }

        ContractCommands::Sign { id } => {
            let id = resolve_contract(client, &id)?;
            let password = prompt_password("Wallet password")?;
            client.sign_contract(&id, password).await?;

            let status = client.status(&id)?;
            println!("Signed contract {}", short_id(&id));
            println!("Status: {}", status);
            if status == ContractStatus::PlayersSigned {
                println!("Send it to the arbiter with: escrow contract submit {}", short_id(&id));
            }
        }

        ContractCommands::Decline { id } => {
            let id = resolve_contract(client, &id)?;
            client.decline_contract(&id).await?;
            println!("Declined contract {}", short_id(&id));
        }

        ContractCommands::Submit { id } => {
            let id = resolve_contract(client, &id)?;
            client.arbiter_sign_contract(&id).await?;
            println!("Contract {} certified by arbiter", short_id(&id));
            println!("Broadcast funding with: escrow contract broadcast {}", short_id(&id));
        }

        ContractCommands::Broadcast { id } => {
            let id = resolve_contract(client, &id)?;
            client.broadcast_funding_tx(&id).await?;
            println!("Funding tx broadcast for contract {}", short_id(&id));
        }

        ContractCommands::Confirm { id } => {
            let id = resolve_contract(client, &id)?;
            client.confirm_funding_tx(&id).await?;
            println!("Contract {} is live", short_id(&id));
        }

        ContractCommands::Dismiss { id, force } => {
            let id = resolve_contract(client, &id)?;
            let status = client.status(&id)?;

            if !force && !status.is_terminal() {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Contract {} is {}. Dismiss anyway?",
                        short_id(&id),
                        status
                    ))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            client.dismiss_contract(&id).await?;
            println!("Dismissed contract {}", short_id(&id));
        }
    }

    Ok(())
}
