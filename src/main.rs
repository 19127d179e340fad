//! Command-line interface for qtibind

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use qtibind::loaders::Location;
#[cfg(feature = "cli")]
use qtibind::{MarshallerFactory, Profile, QtiComponent, SchemaVersion, XmlDocument};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "qtibind")]
#[command(author, version, about = "QTI 2.x data binding tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the marshallers a factory resolves
    Inspect {
        /// QTI version, e.g. 2.1 or 2.2.2
        #[arg(long = "qti-version", default_value = "2.1.0")]
        qti_version: String,

        /// Use the compact profile
        #[arg(long)]
        compact: bool,

        /// Show a single QTI class
        #[arg(short, long)]
        class: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Load a QTI document and report its root class
    Check {
        /// Path to the QTI document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// QTI version (inferred from the document when omitted)
        #[arg(long = "qti-version")]
        qti_version: Option<String>,

        /// Use the compact profile
        #[arg(long)]
        compact: bool,
    },

    /// Load a QTI document with one version and save it with another
    Convert {
        /// Path to the QTI document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target QTI version
        #[arg(long)]
        to: String,

        /// Source QTI version (inferred from the document when omitted)
        #[arg(long)]
        from: Option<String>,

        /// Use the compact profile
        #[arg(long)]
        compact: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qtibind=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect {
            qti_version,
            compact,
            class,
            json,
        } => cmd_inspect(&qti_version, compact, class, json),
        Commands::Check {
            file,
            qti_version,
            compact,
        } => cmd_check(file, qti_version, compact),
        Commands::Convert {
            file,
            to,
            from,
            compact,
            output,
        } => cmd_convert(file, &to, from, compact, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn profile(compact: bool) -> Profile {
    if compact {
        Profile::Compact
    } else {
        Profile::Standard
    }
}

#[cfg(feature = "cli")]
fn load(file: PathBuf, version: Option<String>, compact: bool) -> qtibind::Result<XmlDocument> {
    match version {
        Some(v) => {
            let mut doc = XmlDocument::with_profile(SchemaVersion::parse(&v)?, profile(compact));
            doc.load(&Location::Path(file))?;
            Ok(doc)
        }
        None => {
            let text = qtibind::loaders::Loader::new().load(&Location::Path(file))?;
            XmlDocument::infer_from_string(&text, profile(compact))
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_inspect(
    qti_version: &str,
    compact: bool,
    class: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::{json, Value};

    let factory = MarshallerFactory::with_profile(SchemaVersion::parse(qti_version)?, profile(compact));

    if let Some(name) = class {
        let Some(marshaller) = factory.get_mapping_entry(&name) else {
            return Err(format!(
                "No marshaller for '{}' in QTI {} ({} profile)",
                name,
                factory.version(),
                factory.profile()
            )
            .into());
        };
        if json_output {
            let entry = json!({ "class": name, "marshaller": marshaller.name() });
            println!("{}", serde_json::to_string_pretty(&entry)?);
        } else {
            println!("{} -> {}", name, marshaller.name());
        }
        return Ok(());
    }

    if json_output {
        let entries: Vec<Value> = factory
            .mapping_entries()
            .map(|(class, m)| json!({ "class": class.as_str(), "marshaller": m.name() }))
            .collect();
        let output = json!({
            "version": factory.version().to_string(),
            "profile": factory.profile().as_str(),
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("qtibind v{}", qtibind::VERSION);
        println!();
        println!("QTI {} ({} profile)", factory.version(), factory.profile());
        println!("  Namespace: {}", factory.version().namespace());
        println!("  Entries: {}", factory.mapping_entries().count());
        println!();
        for (class, m) in factory.mapping_entries() {
            println!("  {} -> {}", class.as_str(), m.name());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_check(
    file: PathBuf,
    qti_version: Option<String>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let display = file.display().to_string();
    match load(file, qti_version, compact) {
        Ok(doc) => {
            let root = doc.root.as_ref().map_or("(none)", |c| c.qti_class_name());
            println!("✓ {} is a valid QTI {} '{}' document", display, doc.version(), root);
            Ok(())
        }
        Err(e) => {
            println!("✗ {} could not be loaded", display);
            println!();
            println!("  - {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_convert(
    file: PathBuf,
    to: &str,
    from: Option<String>,
    compact: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = load(file, from, compact)?;
    let target = XmlDocument::with_profile(SchemaVersion::parse(to)?, profile(compact));
    let target = match source.root {
        Some(root) => target.with_root(root),
        None => target,
    };

    match output {
        Some(path) => {
            target.save(&path)?;
            eprintln!("Wrote QTI {} document to {}", target.version(), path.display());
        }
        None => println!("{}", target.save_to_string()?),
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
