//! Guild rosters: the official member names used to flag misread players.

pub mod fetch;
pub mod scrape;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::paths::write_json_atomic;

pub use fetch::fetch_guild_html;
pub use scrape::parse_roster_html;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildRoster {
    pub last_updated: DateTime<Utc>,
    pub members: Vec<String>,
}

/// All known rosters, keyed by guild name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterBook {
    guilds: BTreeMap<String, GuildRoster>,
}

impl RosterBook {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read rosters: {}", path.display()))?;
        serde_json::from_str(&contents)
            .context(format!("Failed to parse rosters: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }

    pub fn guilds(&self) -> impl Iterator<Item = (&String, &GuildRoster)> {
        self.guilds.iter()
    }

    pub fn add_guild(&mut self, guild_name: &str, now: DateTime<Utc>) -> Result<()> {
        let guild_name = guild_name.trim();
        if guild_name.is_empty() {
            bail!("Please enter a guild name.");
        }
        if self.guilds.contains_key(guild_name) {
            bail!("A roster for {} already exists.", guild_name);
        }
        self.guilds.insert(
            guild_name.to_string(),
            GuildRoster {
                last_updated: now,
                members: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn delete_guild(&mut self, guild_name: &str) -> Result<GuildRoster> {
        self.guilds
            .remove(guild_name)
            .ok_or_else(|| anyhow!("No roster for {}", guild_name))
    }

    pub fn set_members(&mut self, guild_name: &str, members: Vec<String>, now: DateTime<Utc>) -> Result<()> {
        let roster = self
            .guilds
            .get_mut(guild_name)
            .ok_or_else(|| anyhow!("No roster for {}", guild_name))?;
        roster.members = members;
        roster.last_updated = now;
        Ok(())
    }

    /// Replaces a guild's members with the names scraped from its profile page.
    pub fn update_from_html(&mut self, guild_name: &str, html: &str, now: DateTime<Utc>) -> Result<usize> {
        let names = parse_roster_html(html)?;
        if names.is_empty() {
            bail!("Could not find any member names for {}", guild_name);
        }
        let count = names.len();
        self.set_members(guild_name, names, now)?;
        crate::log(&format!("Roster for {} updated: {} members", guild_name, count));
        Ok(count)
    }

    /// Every member of every guild.
    pub fn combined_members(&self) -> BTreeSet<String> {
        self.guilds
            .values()
            .flat_map(|roster| roster.members.iter().cloned())
            .collect()
    }
}
