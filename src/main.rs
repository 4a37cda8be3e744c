use anyhow::{Context, bail};
use kr_showtimes::{Chain, Config, RenderStyle, ShowtimeClient};

const USAGE: &str = "usage:
  kr-showtimes <cgv|lotci|megabox|all> <location> [day] [title]
  kr-showtimes locations <cgv|lotci|megabox>
  kr-showtimes refresh <cgv|lotci|megabox> <file>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,kr_showtimes=debug".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else { bail!(USAGE) };

    let config = Config::from_env()?;
    let client = ShowtimeClient::from_config(&config)?;

    match command.as_str() {
        "locations" => {
            let chain: Chain = args.get(1).context(USAGE)?.parse()?;
            for name in client.available_locations(chain) {
                println!("{name}");
            }
        },
        "refresh" => {
            let chain: Chain = args.get(1).context(USAGE)?.parse()?;
            let path = args.get(2).context(USAGE)?;
            let table = client.refresh_code_table(chain).await?;
            table.write_json(path).with_context(|| format!("writing {path}"))?;
            tracing::info!(chain = %chain, path = %path, entries = table.len(), "code table written");
        },
        target => {
            let location = args.get(1).context(USAGE)?;
            let day = match args.get(2) {
                Some(d) => Some(d.parse::<u8>().with_context(|| format!("`{d}` is not a day of month"))?),
                None => None,
            };
            let title = args.get(3).map(String::as_str);

            let clip = if target == "all" {
                let result = client.aggregate(location, day, title).await;
                for (chain, err) in &result.failures {
                    eprintln!("{}: {err}", chain.label());
                }
                if result.failures.len() == Chain::ALL.len() {
                    bail!("no chain returned a schedule for `{location}`");
                }
                result.clip
            } else {
                let chain: Chain = target.parse()?;
                client.query(chain, location, day, title).await?
            };

            if clip.is_empty() {
                println!("no screenings found");
            } else {
                print!("{}", client.render(&clip, RenderStyle { color: true }).await);
            }
        },
    }

    Ok(())
}
