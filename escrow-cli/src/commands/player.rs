use crate::commands::{player_by_name, prompt_new_password, Client};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use escrow_core::Result;

#[derive(Subcommand)]
pub enum PlayerCommands {
    /// Register a new player with keys in the local wallet
    New {
        /// Player name
        name: String,
    },
    /// Add a remote player
    Add {
        /// Player name
        name: String,
    },
    /// List known players
    List,
    /// Remove a player
    Remove {
        /// Player name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_player_command(cmd: PlayerCommands, client: &Client) -> Result<()> {
    match cmd {
        PlayerCommands::New { name } => {
            let password = prompt_new_password()?;
            let player = client.new_player(&name, password).await?;

            println!("Registered player '{}'", player.name);
            println!("  ID: {}", player.id);
            if client.store().selected_player().is_none() {
                client.select_player(&player.id)?;
                println!("  Selected as local player");
            }
        }

        PlayerCommands::Add { name } => {
            let player = client.add_player(&name).await?;
            println!("Added player '{}' ({})", player.name, player.id);
        }

        PlayerCommands::List => {
            let players = client.store().players();
            if players.is_empty() {
                println!("No players found.");
                println!("Register one with: escrow player new <name>");
                return Ok(());
            }

            let selected = client.store().selected_player();
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "ID", "Mine", "Selected"]);

            for player in players {
                let is_selected = selected.as_ref() == Some(&player.id);
                table.add_row(vec![
                    player.name,
                    player.id.to_string(),
                    if player.mine { "yes" } else { "" }.to_string(),
                    if is_selected { "*" } else { "" }.to_string(),
                ]);
            }

            println!("{}", table);
        }

        PlayerCommands::Remove { name, force } => {
            let player = player_by_name(client, &name)?;

            if !force {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Remove player '{}'?", player.name))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            client.remove_player(&player.id).await?;
            println!("Removed player '{}'", player.name);
        }
    }

    Ok(())
}
