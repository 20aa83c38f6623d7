use crate::commands::{prompt_password, resolve_contract, short_id, Client};
use clap::Subcommand;
use escrow_core::{Amount, PayoutCredential, Result};

#[derive(Subcommand)]
pub enum PayoutCommands {
    /// Propose a payout split for a live contract
    New {
        /// Contract ID (or unique prefix)
        contract: String,
        /// Amount paid to player one in satoshis
        p1_amount: u64,
        /// Amount paid to player two in satoshis
        p2_amount: u64,
    },
    /// Sign the payout as the local player
    Sign {
        /// Contract ID (or unique prefix)
        contract: String,
        /// Sign with an arbitration token instead of the wallet password
        #[arg(short, long)]
        token: bool,
    },
    /// Send a token-signed payout to the arbiter
    Submit {
        /// Contract ID (or unique prefix)
        contract: String,
    },
    /// Deny a proposed payout
    Deny {
        /// Contract ID (or unique prefix)
        contract: String,
    },
    /// Broadcast the payout transaction
    Broadcast {
        /// Contract ID (or unique prefix)
        contract: String,
    },
    /// Mark the payout transaction as confirmed
    Confirm {
        /// Contract ID (or unique prefix)
        contract: String,
    },
}

pub async fn handle_payout_command(cmd: PayoutCommands, client: &Client) -> Result<()> {
    match cmd {
        PayoutCommands::New {
            contract,
            p1_amount,
            p2_amount,
        } => {
            let id = resolve_contract(client, &contract)?;
            client
                .new_payout(&id, Amount::from_sat(p1_amount), Amount::from_sat(p2_amount))
                .await?;

            println!("Proposed payout for contract {}", short_id(&id));
            println!("  Player One: {} sats", p1_amount);
            println!("  Player Two: {} sats", p2_amount);
        }

        PayoutCommands::Sign { contract, token } => {
            let id = resolve_contract(client, &contract)?;
            let credential = if token {
                PayoutCredential::Token(prompt_password("Arbitration token")?)
            } else {
                PayoutCredential::Password(prompt_password("Wallet password")?)
            };
            client.sign_payout(&id, credential).await?;

            println!("Signed payout for contract {}", short_id(&id));
            println!("Status: {}", client.status(&id)?);
        }

        PayoutCommands::Submit { contract } => {
            let id = resolve_contract(client, &contract)?;
            client.arbiter_sign_payout(&id).await?;
            println!("Payout for contract {} signed by arbiter", short_id(&id));
        }

        PayoutCommands::Deny { contract } => {
            let id = resolve_contract(client, &contract)?;
            client.deny_payout(&id).await?;
            println!("Denied payout for contract {}", short_id(&id));
        }

        PayoutCommands::Broadcast { contract } => {
            let id = resolve_contract(client, &contract)?;
            client.broadcast_payout_tx(&id).await?;
            println!("Payout tx broadcast for contract {}", short_id(&id));
        }

        PayoutCommands::Confirm { contract } => {
            let id = resolve_contract(client, &contract)?;
            client.confirm_payout_tx(&id).await?;
            println!("Contract {} resolved", short_id(&id));
        }
    }

    Ok(())
}
