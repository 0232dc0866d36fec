use tonkbot::AppConfig;
use tonkbot::Result;

fn main() -> Result<()> {
    println!("🔍 Checking configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("✅ Configuration loaded successfully!");
            println!("📋 Configuration details:");
            println!("  Username: {}", or_unset(&config.reddit.username));
            println!("  Password: {}", mask_secret(&config.reddit.password));
            println!("  Client ID: {}", mask_secret(&config.reddit.client_id));
            println!("  Client secret: {}", mask_secret(&config.reddit.client_secret));
            println!("  Human account: {}", or_unset(&config.reddit.human_account));
            println!("  User agent: {}", config.reddit.user_agent);
            println!("  Target term: {}", config.target_term());
            println!("  Streams: {}", config.bot.streams.join(", "));
            println!("  Comment in: {}", config.bot.allowed_communities.join(", "));
            println!("  No summons in: {}", config.bot.summon_excluded.join(", "));
            println!("  Max posts per run: {}", config.bot.max_posts_per_run);
            println!("  Downvote threshold: {}", config.bot.downvote_threshold);
            println!("  Strict model integrity: {}", config.bot.strict_integrity);
            println!("  Model: {}", config.paths.model.display());
            println!("  History: {}", config.paths.history.display());
            println!("  Deleted log: {}", config.paths.deleted.display());

            match config.validate_bot() {
                Ok(()) => println!("\n🎉 Configuration check completed successfully!"),
                Err(e) => {
                    println!("\n⚠️  Not ready to run the bot: {e}");
                    println!("  Set the [reddit] credentials in tonkbot.toml or TONKBOT_* variables");
                }
            }
        }
        Err(e) => {
            println!("❌ Configuration error: {e}");
            println!("\n💡 To fix this:");
            println!("  1. Copy config.example.toml to tonkbot.toml");
            println!("  2. Fill in the [reddit] credentials");
            println!("  3. Run this check again");
            return Err(e);
        }
    }

    Ok(())
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}

/// Hide all but the first two characters
fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(unset)".to_string();
    }
    let visible: String = secret.chars().take(2).collect();
    format!("{visible}***")
}
