use anyhow::Result;
use owo_colors::OwoColorize;
use weekrooster::AppConfig;
use weekrooster::feed::normalize_feed_url;

pub fn add(name: &str, url: &str) -> Result<()> {
    let mut cfg = AppConfig::load()?;
    cfg.add_schedule(name, url)?;
    cfg.save()?;

    println!("Added schedule {} ({})", name.green(), normalize_feed_url(url).dimmed());
    println!("Run `weekrooster show` to see this week.");
    Ok(())
}

pub fn list() -> Result<()> {
    let cfg = AppConfig::load()?;

    if cfg.schedules.is_empty() {
        super::print_not_configured();
        return Ok(());
    }

    let active = cfg.active().map(|s| s.name.clone());
    for source in &cfg.schedules {
        let marker = if Some(&source.name) == active.as_ref() { "*" } else { " " };
        println!("{} {}  {}", marker, source.name, source.url.dimmed());
    }
    Ok(())
}

pub fn use_schedule(name: &str) -> Result<()> {
    let mut cfg = AppConfig::load()?;
    cfg.use_schedule(name)?;
    cfg.save()?;

    println!("Now showing {}", name.green());
    Ok(())
}

pub fn remove(name: &str) -> Result<()> {
    let mut cfg = AppConfig::load()?;
    let removed = cfg.remove_schedule(name)?;
    cfg.save()?;

    println!("Removed schedule {}", removed.name.red());
    if let Some(active) = cfg.active() {
        println!("Now showing {}", active.name.green());
    }
    Ok(())
}
