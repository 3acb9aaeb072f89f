use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use icn_crypto::{KeyAlgorithm, KeyPair};
use icn_pki::{Certificate, CertificateStore};
use icn_pki_cli::{KeyFile, PkiConfig, SledCertificatePersistence};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Command-line interface for ICN peer certificates
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// Path to the configuration file.
    #[clap(short, long, value_parser, default_value = "config/pki.toml", global = true)]
    config: PathBuf,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Keypair management commands
    #[clap(subcommand)]
    Keypair(KeypairCommands),

    /// Certificate management commands
    #[clap(subcommand)]
    Certificate(CertificateCommands),

    /// Show how sure the owner can be of a subject's key
    Assurance {
        /// Identifier of the subject
        #[clap(long, short)]
        subject: String,

        /// Print the result as JSON
        #[clap(long)]
        json: bool,
    },
}

/// Keypair management commands
#[derive(Subcommand)]
enum KeypairCommands {
    /// Generate a new keypair
    Generate {
        /// Key algorithm (ed25519, secp256k1)
        #[clap(long, short, default_value = "ed25519")]
        algorithm: KeyAlgorithm,

        /// Output file for the keypair
        #[clap(long, short)]
        output: PathBuf,

        /// Also write a shareable public-only key file
        #[clap(long)]
        public_output: Option<PathBuf>,
    },

    /// Show information about a keypair
    Info {
        /// Path to the keypair file
        #[clap(long, short)]
        input: PathBuf,
    },
}

/// Certificate management commands
#[derive(Subcommand)]
enum CertificateCommands {
    /// Sign a subject's key as the owner and store the certificate
    Issue {
        /// Identifier of the subject
        #[clap(long)]
        subject_id: String,

        /// Display name of the subject
        #[clap(long)]
        subject_name: String,

        /// Key file holding the subject's public key
        #[clap(long)]
        subject_key: PathBuf,

        /// Start of validity in milliseconds since the epoch (defaults to now)
        #[clap(long)]
        valid_since: Option<i64>,

        /// Also write the encoded certificate to this file
        #[clap(long, short)]
        output: Option<PathBuf>,
    },

    /// Store an encoded certificate received from a peer
    Import {
        /// Path to the encoded certificate
        #[clap(long, short)]
        input: PathBuf,
    },

    /// List stored certificates
    List {
        /// Only certificates about this subject
        #[clap(long, conflicts_with = "signer")]
        owner: Option<String>,

        /// Only certificates issued by this signer
        #[clap(long)]
        signer: Option<String>,
    },

    /// Remove the certificates a signer issued about an owner
    Remove {
        #[clap(long)]
        owner: String,

        #[clap(long)]
        signer: String,
    },
}

fn init_tracing(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<PkiConfig> {
    let config = PkiConfig::load(path)?;
    init_tracing(config.log_level.as_deref());
    info!("Loaded configuration from: {:?}", path);
    Ok(config)
}

fn open_store(config: &PkiConfig) -> Result<CertificateStore<SledCertificatePersistence>> {
    let persistence = SledCertificatePersistence::open(&config.storage_path)
        .context("Failed to initialize certificate storage")?;
    Ok(CertificateStore::new(
        config.owner_id.clone(),
        config.owner_name.clone(),
        persistence,
    ))
}

fn load_owner_keypair(config: &PkiConfig) -> Result<KeyPair> {
    KeyFile::read(&config.key_path)?
        .keypair()
        .context("Failed to load owner keypair")
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| format!("{} ms", millis))
}

fn print_certificate(certificate: &Certificate) {
    let status = if certificate.is_expired() {
        "expired".red()
    } else {
        "valid".green()
    };
    println!(
        "{} -> {} [{}] {} .. {} ({}, {})",
        certificate.signer_id().bold(),
        certificate.owner_id().bold(),
        status,
        format_millis(certificate.valid_since()),
        format_millis(certificate.valid_until()),
        certificate.signing_algorithm(),
        certificate.public_key()
    );
    if let Some(address) = certificate.storage_address() {
        println!("    stored at {}", address);
    }
}

/// Generate a new keypair
fn keypair_generate(
    algorithm: KeyAlgorithm,
    output: &Path,
    public_output: Option<&Path>,
) -> Result<()> {
    let keypair = KeyPair::generate(algorithm);
    let file = KeyFile::from_keypair(&keypair);
    file.write(output)?;
    println!("Keypair saved to: {}", output.display());

    if let Some(public_output) = public_output {
        file.public_only().write(public_output)?;
        println!("Public key saved to: {}", public_output.display());
    }
    println!("Public Key: {}", keypair.public);
    Ok(())
}

/// Show information about a keypair
fn keypair_info(input: &Path) -> Result<()> {
    println!("Reading keypair from: {}", input.display());
    let file = KeyFile::read(input)?;

    match file.public_key() {
        Ok(public_key) => println!("Public Key: {}", public_key),
        Err(e) => println!(
            "Public Key: {} ({})",
            file.public_key.red(),
            e.to_string().yellow()
        ),
    }
    match (&file.secret_key, file.keypair()) {
        (None, _) => println!("Secret Key: {}", "absent".yellow()),
        (Some(_), Ok(_)) => println!("Secret Key: {}", "present".green()),
        (Some(_), Err(e)) => println!("Secret Key: {}", e.to_string().red()),
    }
    println!("Generated: {}", file.generated_at);
    Ok(())
}

fn certificate_issue(
    config: &PkiConfig,
    subject_id: &str,
    subject_name: &str,
    subject_key: &Path,
    valid_since: Option<i64>,
    output: Option<&Path>,
) -> Result<()> {
    let owner = load_owner_keypair(config)?;
    let subject_key = KeyFile::read(subject_key)?
        .public_key()
        .context("Failed to load subject public key")?;
    let algorithm = config.signing_algorithm(owner.algorithm())?;

    let certificate = Certificate::produce(
        config.owner_id.as_str(),
        config.owner_name.as_str(),
        owner.private_key(),
        subject_id,
        subject_name,
        subject_key,
        valid_since.unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        algorithm.name(),
    )
    .context("Failed to produce certificate")?;

    let mut store = open_store(config)?;
    let address = store.store(&certificate)?;
    println!("{} certificate for {} at {}", "Issued".green(), subject_id, address);

    if let Some(output) = output {
        fs::write(output, certificate.to_bytes()).with_context(|| {
            format!("Failed to write certificate to '{}'", output.display())
        })?;
        println!("Certificate written to: {}", output.display());
    }
    Ok(())
}

fn certificate_import(config: &PkiConfig, input: &Path) -> Result<()> {
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read certificate '{}'", input.display()))?;
    let certificate = Certificate::from_bytes(&bytes)
        .with_context(|| format!("Failed to decode certificate '{}'", input.display()))?;

    let mut store = open_store(config)?;
    let address = store.store(&certificate)?;
    println!("{} certificate at {}", "Imported".green(), address);
    print_certificate(&certificate);
    Ok(())
}

fn certificate_list(
    config: &PkiConfig,
    owner: Option<&str>,
    signer: Option<&str>,
) -> Result<()> {
    let mut store = open_store(config)?;
    let mut certificates: Vec<Certificate> = match (owner, signer) {
        (Some(owner), _) => store.certificates_by_owner(owner)?.into_iter().collect(),
        (None, Some(signer)) => store.certificates_by_signer(signer)?.into_iter().collect(),
        (None, None) => store.all_certificates()?,
    };
    certificates.sort_by(|a, b| {
        a.owner_id()
            .cmp(b.owner_id())
            .then(a.signer_id().cmp(b.signer_id()))
            .then(a.valid_since().cmp(&b.valid_since()))
    });

    if certificates.is_empty() {
        println!("No certificates found.");
    }
    for certificate in &certificates {
        print_certificate(certificate);
    }
    Ok(())
}

fn certificate_remove(config: &PkiConfig, owner: &str, signer: &str) -> Result<()> {
    let mut store = open_store(config)?;
    let matching: Vec<Certificate> = store
        .certificates_by_owner(owner)?
        .into_iter()
        .filter(|c| c.signer_id() == signer)
        .collect();
    if matching.is_empty() {
        bail!("No certificate about {} signed by {}", owner, signer);
    }
    for certificate in &matching {
        store.remove(certificate)?;
    }
    println!("{} {} certificate(s)", "Removed".green(), matching.len());
    Ok(())
}

fn assurance(config: &PkiConfig, subject: &str, json: bool) -> Result<()> {
    let owner = load_owner_keypair(config)?;
    let directory = config.peer_directory(owner.public.clone())?;
    let mut store = open_store(config)?;

    let assurance = store
        .assurance_of(subject, &directory)
        .with_context(|| format!("Failed to evaluate identity assurance for {}", subject))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&assurance)?);
        return Ok(());
    }
    println!("Subject: {}", subject.bold());
    println!("Level: {}/10", assurance.level());
    println!("Probability: {:.3}", assurance.probability());
    if assurance.path().is_empty() {
        println!("Path: {}", "none".yellow());
    } else {
        println!("Path: {}", assurance.path().join(" <- "));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Keypair(cmd) => {
            init_tracing(None);
            match cmd {
                KeypairCommands::Generate {
                    algorithm,
                    output,
                    public_output,
                } => keypair_generate(*algorithm, output, public_output.as_deref())?,
                KeypairCommands::Info { input } => keypair_info(input)?,
            }
        }
        Commands::Certificate(cmd) => {
            let config = load_config(&cli.config)?;
            match cmd {
                CertificateCommands::Issue {
                    subject_id,
                    subject_name,
                    subject_key,
                    valid_since,
                    output,
                } => certificate_issue(
                    &config,
                    subject_id,
                    subject_name,
                    subject_key,
                    *valid_since,
                    output.as_deref(),
                )?,
                CertificateCommands::Import { input } => certificate_import(&config, input)?,
                CertificateCommands::List { owner, signer } => {
                    certificate_list(&config, owner.as_deref(), signer.as_deref())?
                }
                CertificateCommands::Remove { owner, signer } => {
                    certificate_remove(&config, owner, signer)?
                }
            }
        }
        Commands::Assurance { subject, json } => {
            let config = load_config(&cli.config)?;
            assurance(&config, subject, *json)?;
        }
    }

    Ok(())
}
