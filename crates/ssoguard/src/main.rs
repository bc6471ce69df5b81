#![forbid(unsafe_code)]

//! ssoguard CLI: validate SAML responses against IdP metadata.

use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use ssoguard_core::{ns, Clock, Error, FixedClock, SystemClock};
use ssoguard_dsig::{sign_element, sign_enveloped, SignOptions};
use ssoguard_keys::{loader, TrustedCertificate};
use ssoguard_saml::{Auth, AuthResponse, EntityDescriptor, Validator, ValidatorConfig};
use ssoguard_xml::document::{element_id, find_child_elements};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ssoguard",
    about = "ssoguard: SAML 2.0 IdP response validation",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a SAML response against IdP metadata
    Validate {
        /// IdP metadata XML file
        #[arg(short, long)]
        metadata: PathBuf,

        /// Response file (base64 form value or raw XML)
        #[arg(short, long)]
        response: PathBuf,

        /// Validate as of this RFC 3339 instant instead of now
        #[arg(long)]
        now: Option<String>,

        /// Accept SHA-1 digest and signature methods
        #[arg(long = "allow-sha1")]
        allow_sha1: bool,

        /// Accepted audience (repeatable)
        #[arg(long)]
        audience: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the certificates trusted by IdP metadata
    Trust {
        /// IdP metadata XML file
        #[arg(short, long)]
        metadata: PathBuf,

        /// Check validity as of this RFC 3339 instant instead of now
        #[arg(long)]
        now: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Sign a SAML response template (for testing IdP integrations)
    Sign {
        /// Response XML file
        template: PathBuf,

        /// Private key (PEM)
        #[arg(short = 'k', long)]
        key: PathBuf,

        /// Signer certificate (PEM), embedded in KeyInfo
        #[arg(long)]
        cert: Option<PathBuf>,

        /// What to sign
        #[arg(long, value_enum, default_value_t = SignTarget::Response)]
        element: SignTarget,

        /// Base64-encode the output like the HTTP-POST binding does
        #[arg(long = "base64")]
        encode: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SignTarget {
    /// The response element
    Response,
    /// Every assertion directly under the response
    Assertion,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            metadata,
            response,
            now,
            allow_sha1,
            audience,
            verbose,
        } => {
            init_tracing(verbose);
            cmd_validate(metadata, response, now, allow_sha1, audience)
        }

        Commands::Trust { metadata, now, verbose } => {
            init_tracing(verbose);
            cmd_trust(metadata, now)
        }

        Commands::Sign {
            template,
            key,
            cert,
            element,
            encode,
            output,
            verbose,
        } => {
            init_tracing(verbose);
            cmd_sign(template, key, cert, element, encode, output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_validate(
    metadata: PathBuf,
    response: PathBuf,
    now: Option<String>,
    allow_sha1: bool,
    audience: Vec<String>,
) -> Result<(), Error> {
    let metadata_xml = read_file(&metadata)?;
    let raw = read_file(&response)?;

    let config = ValidatorConfig::default()
        .with_clock(clock(now.as_deref())?)
        .with_allow_sha1(allow_sha1)
        .with_audiences(audience);
    let validator = Validator::new(&metadata_xml, config).map_err(|e| Error::Other(e.to_string()))?;

    let auth = if raw.trim_start().starts_with('<') {
        AuthResponse::from_xml(&raw)
    } else {
        AuthResponse::new(raw)
    };
    let auth = validator.validate(auth).map_err(|e| Error::Other(e.to_string()))?;

    println!("OK");
    println!("user: {}", auth.user_id());
    if let Some(verified) = auth.response() {
        println!("signed: {:?} by {}", verified.scope(), verified.signers().join(", "));
        if let Some(assertion) = &verified.response().assertion {
            for attr in &assertion.attributes {
                let name = attr.friendly_name.as_deref().unwrap_or(&attr.name);
                println!("  {name} = {}", attr.values.join(", "));
            }
        }
    }
    Ok(())
}

fn cmd_trust(metadata: PathBuf, now: Option<String>) -> Result<(), Error> {
    let metadata_xml = read_file(&metadata)?;
    let descriptor = EntityDescriptor::parse(&metadata_xml)?;
    let store = descriptor.trust_store().map_err(|e| Error::Other(e.to_string()))?;
    let at = clock(now.as_deref())?.now();

    println!("entity: {}", descriptor.entity_id);
    if store.is_empty() {
        println!("no trusted certificates");
        return Ok(());
    }
    for cert in store.roots() {
        let state = match cert.check_validity(at) {
            Ok(()) => "valid".to_owned(),
            Err(e) => e.to_string(),
        };
        println!("{}", cert.subject());
        println!("  issuer:  {}", cert.issuer());
        println!("  serial:  {}", cert.serial());
        println!("  key:     {}", cert.key().algorithm_name());
        println!("  from:    {}", cert.not_before()?);
        println!("  until:   {}", cert.not_after()?);
        println!("  status:  {state}");
    }
    Ok(())
}

fn cmd_sign(
    template: PathBuf,
    key: PathBuf,
    cert: Option<PathBuf>,
    element: SignTarget,
    encode: bool,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let xml = read_file(&template)?;
    let key = loader::load_private_key_pem(&read_bytes(&key)?)?;
    let cert_der = match cert {
        Some(path) => {
            let cert = TrustedCertificate::from_pem(&read_bytes(&path)?)?;
            if !key.public_matches(cert.key()) {
                return Err(Error::Key(format!("{} does not match the signing key", path.display())));
            }
            Some(cert.der().to_vec())
        }
        None => None,
    };
    let options = SignOptions::default();

    let signed = match element {
        SignTarget::Response => sign_enveloped(&xml, &key, cert_der.as_deref(), &options)?,
        SignTarget::Assertion => {
            let ids: Vec<String> = {
                let doc = ssoguard_xml::parse(&xml)?;
                find_child_elements(doc.root_element(), ns::SAML, ns::node::ASSERTION)
                    .into_iter()
                    .map(|a| {
                        element_id(a)
                            .map(str::to_owned)
                            .ok_or_else(|| Error::MissingAttribute("ID on Assertion".into()))
                    })
                    .collect::<Result<_, _>>()?
            };
            if ids.is_empty() {
                return Err(Error::MissingElement("Assertion".into()));
            }
            let mut signed = xml;
            for id in &ids {
                signed = sign_element(&signed, id, &key, cert_der.as_deref(), &options)?;
            }
            signed
        }
    };

    let out = if encode {
        base64::engine::general_purpose::STANDARD.encode(signed)
    } else {
        signed
    };
    write_output(output, out.as_bytes())
}

fn clock(now: Option<&str>) -> Result<Arc<dyn Clock>, Error> {
    let clock: Arc<dyn Clock> = match now {
        Some(at) => Arc::new(FixedClock::parse(at)?),
        None => Arc::new(SystemClock),
    };
    Ok(clock)
}

fn read_file(path: &PathBuf) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn read_bytes(path: &PathBuf) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|e| Error::Other(format!("{}: {e}", p.display()))),
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(data)
                .map_err(|e| Error::Other(format!("stdout: {e}")))
        }
    }
}
