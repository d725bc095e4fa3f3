//! The options for the pixeltrack client.

use std::fmt;
use clap::Parser;
use serde::Serialize;
use url::Url;
use crate::api::event::EventList;
use crate::api::opens::OpensReport;
use crate::api::status::HealthStatus;
use crate::api::token::{PixelUrl, TrackingId};
use crate::constants::PIXELTRACK_ENV_SERVER;
use super::client::{self, PixeltrackClient};
use super::report::{Report, ReportFormat};


//------------ Options -------------------------------------------------------

/// The command line options for the pixeltrack client.
#[derive(clap::Parser)]
#[command(
    version,
    about = "The pixeltrack command line client.",
)]
pub struct Options {
    #[command(flatten)]
    pub general: GeneralOptions,

    #[command(subcommand)]
    pub command: Command,
}

impl Options {
    /// Creates the options from the process arguments.
    ///
    /// If the arguments won’t result in usable options, exits the process.
    pub fn from_args() -> Self {
        Self::parse()
    }
}


//------------ GeneralOptions ------------------------------------------------

/// The options common between all commands.
#[derive(clap::Args)]
pub struct GeneralOptions {
    /// The base URI of the pixeltrack server.
    #[arg(
        short, long,
        env = PIXELTRACK_ENV_SERVER,
        default_value = "http://localhost:3000/"
    )]
    pub server: Url,

    /// Report format
    #[arg(
        short, long,
        env = "PIXELTRACK_FORMAT",
        default_value = "text",
    )]
    pub format: ReportFormat,

    /// Only show the API call and exit.
    #[arg(long)]
    pub api: bool,
}


//------------ Command -------------------------------------------------------

#[derive(clap::Subcommand)]
pub enum Command {
    /// Create a new tracking token and print its pixel URL.
    Token(Token),

    /// Show the most recent tracking events.
    Events(Events),

    /// Show the genuine opens among the most recent events.
    Opens(Opens),

    /// Check that the server is running.
    Health(Health),
}

impl Command {
    pub async fn run(self, client: &PixeltrackClient) -> Report {
        match self {
            Self::Token(cmd) => cmd.run(client).into(),
            Self::Events(cmd) => cmd.run(client).await.into(),
            Self::Opens(cmd) => cmd.run(client).await.into(),
            Self::Health(cmd) => cmd.run(client).await.into(),
        }
    }
}


//------------ Token ---------------------------------------------------------

#[derive(clap::Parser)]
pub struct Token {
    /// The subject of the message the pixel goes into.
    #[arg(long)]
    subject: Option<String>,

    /// The recipient of the message the pixel goes into.
    #[arg(long)]
    to: Option<String>,
}

impl Token {
    pub fn run(
        self, client: &PixeltrackClient
    ) -> Result<TokenInfo, client::Error> {
        let url = PixelUrl::new(
            client.server(),
            TrackingId::generate(),
            self.subject.as_deref(),
            self.to.as_deref(),
        ).map_err(|e| {
            client::Error::request_build(client.server().as_str(), e)
        })?;
        Ok(TokenInfo::from(url))
    }
}

/// A freshly generated token and how to embed it.
#[derive(Clone, Debug, Serialize)]
pub struct TokenInfo {
    pub id: TrackingId,
    pub url: String,
    pub html: String,
}

impl From<PixelUrl> for TokenInfo {
    fn from(url: PixelUrl) -> Self {
        TokenInfo {
            id: url.id().clone(),
            url: url.to_string(),
            html: url.to_html(),
        }
    }
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "id:   {}", self.id)?;
        writeln!(f, "url:  {}", self.url)?;
        writeln!(f, "html: {}", self.html)
    }
}


//------------ Events --------------------------------------------------------

#[derive(clap::Parser)]
pub struct Events;

impl Events {
    pub async fn run(
        self, client: &PixeltrackClient
    ) -> Result<EventList, client::Error> {
        client.events().await
    }
}


//------------ Opens ---------------------------------------------------------

#[derive(clap::Parser)]
pub struct Opens;

impl Opens {
    pub async fn run(
        self, client: &PixeltrackClient
    ) -> Result<OpensReport, client::Error> {
        client.events().await.map(|list| {
            OpensReport::from_events(&list.events)
        })
    }
}


//------------ Health --------------------------------------------------------

#[derive(clap::Parser)]
pub struct Health;

impl Health {
    pub async fn run(
        self, client: &PixeltrackClient
    ) -> Result<HealthStatus, client::Error> {
        client.health().await
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_options() {
        let options = Options::try_parse_from([
            "pixeltrackc", "--server", "http://tracker.example.com/",
            "--format", "json",
            "token", "--subject", "Hello & welcome", "--to", "bob@example.com"
        ]).unwrap();
        assert_eq!(options.general.format, ReportFormat::Json);
        assert!(!options.general.api);
        assert!(matches!(options.command, Command::Token(_)));

        assert!(Options::try_parse_from(["pixeltrackc", "events"]).is_ok());
        assert!(Options::try_parse_from([
            "pixeltrackc", "--format", "xml", "events"
        ]).is_err());
        assert!(Options::try_parse_from(["pixeltrackc", "delete"]).is_err());
    }

    #[test]
    fn token_info() {
        let client = PixeltrackClient::new(
            Url::parse("http://tracker.example.com/").unwrap()
        ).unwrap();
        let info = Token {
            subject: Some("Hello & welcome".into()),
            to: None
        }.run(&client).unwrap();
        assert!(info.url.starts_with(&format!(
            "http://tracker.example.com/pixel?id={}&subject=", info.id
        )));
        assert!(info.html.starts_with("<img src=\""));
    }
}
