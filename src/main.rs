//! # Laudo CLI
//!
//! Usage:
//!   laudo report.json -o layout.json
//!   cat report.json | laudo --kind hidrantes --summary
//!   laudo records.json --record-id abc123 --kind cftv
//!   laudo --example > report.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use laudo::layout::Paginator;
use laudo::model::{Report, ReportKind};
use laudo::profile::PaginationProfile;
use laudo::store::{load_report, EntityKind, MemoryEntityClient};
use laudo::LaudoError;

#[derive(Parser, Debug)]
#[command(name = "laudo", version, about = "Paginate inspection reports for printing")]
struct Cli {
    /// Report JSON (or a JSON array of records with --record-id). Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Write output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report type; overrides the kind stored in the report
    #[arg(short, long)]
    kind: Option<ReportKind>,

    /// JSON file with profile fields to override
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Load this record id from the input array
    #[arg(long)]
    record_id: Option<String>,

    /// Print a one-line-per-page plan instead of JSON
    #[arg(long)]
    summary: bool,

    /// Print an example report and exit
    #[arg(long)]
    example: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_report_json());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), LaudoError> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut report = match &cli.record_id {
        Some(id) => {
            let kind = cli.kind.unwrap_or_default();
            let entity = EntityKind::for_report(kind).unwrap_or(EntityKind::FormularioVistoria);
            let client = MemoryEntityClient::from_json_array(entity, &input)?;
            load_report(&client, id, kind)?
        }
        None => serde_json::from_str::<Report>(&input)?,
    };
    if let Some(kind) = cli.kind {
        report.kind = kind;
    }

    let base = PaginationProfile::for_kind(report.kind);
    let profile = match &cli.profile {
        Some(path) => PaginationProfile::merge_json(&base, &fs::read_to_string(path)?)?,
        None => base,
    };
    let layout = Paginator::new(profile)?.paginate(&report);

    let rendered = if cli.summary {
        layout.summary()
    } else {
        let mut json = serde_json::to_string_pretty(&layout)?;
        json.push('\n');
        json
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &rendered)?;
            eprintln!(
                "✓ {} page(s) written to {}",
                layout.total_pages,
                path.display()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn example_report_json() -> &'static str {
    r##"{
  "kind": "cftv",
  "title": "Vistoria de CFTV - Torre A",
  "project": "Residencial Aurora",
  "sections": [
    {
      "name": "Subsolo 1",
      "items": [
        {
          "description": "Câmera da rampa de acesso",
          "status": "ok",
          "observation": "Imagem nítida, gravação contínua verificada.",
          "photos": ["https://cdn.example.com/ss1-rampa-1.jpg", "https://cdn.example.com/ss1-rampa-2.jpg"]
        },
        {
          "description": "Câmera do hall dos elevadores",
          "status": "na",
          "observation": "Ponto ainda não instalado."
        },
        {
          "description": "DVR e nobreak",
          "status": "ok",
          "observation": "",
          "photos": [
            "https://cdn.example.com/dvr-1.jpg",
            "https://cdn.example.com/dvr-2.jpg",
            "https://cdn.example.com/dvr-3.jpg",
            "https://cdn.example.com/dvr-4.jpg",
            "https://cdn.example.com/dvr-5.jpg",
            "https://cdn.example.com/dvr-6.jpg",
            "https://cdn.example.com/dvr-7.jpg",
            { "url": "https://cdn.example.com/dvr-8.jpg", "caption": "Etiqueta do nobreak" }
          ]
        }
      ],
      "comments": "Reavaliar o hall dos elevadores após a instalação do ponto."
    },
    {
      "name": "Térreo",
      "items": [
        { "description": "Câmera da portaria", "status": "ok" },
        { "description": "Câmera do portão de veículos", "status": "ok" },
        { "description": "Monitor da guarita", "status": "ok" }
      ]
    }
  ]
}
"##
}
