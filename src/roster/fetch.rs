use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// Downloads the guild profile page for `guild_name`.
pub fn fetch_guild_html(base_url: &str, guild_name: &str, region: &str) -> Result<String> {
    crate::log(&format!(
        "Fetching roster for {} ({}) from {}",
        guild_name, region, base_url
    ));

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client
        .get(base_url)
        .query(&[("guildName", guild_name), ("region", region)])
        .header("User-Agent", "guild-stats")
        .send()
        .context("Could not fetch guild roster. The website may be down.")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Could not fetch guild roster for {}: HTTP {}",
            guild_name,
            response.status()
        ));
    }

    response.text().context("Failed to read guild page body")
}
