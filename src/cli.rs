use clap::{Parser, Subcommand};

/// indietoken — IndieAuth token endpoint
#[derive(Parser)]
#[command(name = "indietoken", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the token endpoint server
    Serve {
        /// Port to bind. Defaults to INDIETOKEN_PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage the trusted authorization endpoint allow-list
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommands,
    },

    /// Inspect or revoke issued tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum EndpointCommands {
    /// Trust an authorization endpoint (exact URL match)
    Add { url: String },
    /// List trusted endpoints
    List,
    /// Stop trusting an authorization endpoint
    Remove { url: String },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Show a token's identity, client, scope and state
    Show { value: String },
    /// Revoke a token
    Revoke { value: String },
}
