use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use pdfreorg::config::OrganizerConfig;
use pdfreorg::entry::EntryId;
use pdfreorg::i18n::{Locale, TextKey, localize};
use pdfreorg::import::UploadedFile;
use pdfreorg::pdf::PdfReader;
use pdfreorg::session::Session;
use pdfreorg::writer::PdfWriter;
use pdfreorg::OrganizerError;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "pdfreorg")]
#[command(about = "Reorder, delete and insert blank pages in a PDF")]
struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Import a PDF and list its page tiles")]
    Tiles {
        #[arg(help = "Input PDF file")]
        input: String,
        #[arg(long, help = "Directory to write PNG thumbnails into")]
        thumbs: Option<PathBuf>,
        #[command(flatten)]
        settings: Settings,
    },
    #[command(about = "Apply page edits and save the result")]
    Edit {
        #[arg(help = "Input PDF file")]
        input: String,
        #[arg(short, long, help = "Output PDF file (defaults to the configured file name)")]
        output: Option<String>,
        #[arg(
            long = "op",
            help = "Edit to apply, in order: delete:<pos>, blank:<pos>, blank:end, move:<from>:<to> (1-indexed)"
        )]
        ops: Vec<EditOp>,
        #[command(flatten)]
        settings: Settings,
    },
    #[command(about = "Print the localized UI strings")]
    Strings {
        #[arg(long, help = "Locale (en, pl); all locales when omitted")]
        locale: Option<Locale>,
    },
}

#[derive(Args)]
struct Settings {
    #[arg(long, help = "JSON config file")]
    config: Option<PathBuf>,
    #[arg(long, help = "Locale for labels (en, pl)")]
    locale: Option<Locale>,
    #[arg(long, help = "Thumbnail scale factor")]
    scale: Option<f32>,
}

impl Settings {
    /// Config file values, overridden by flags.
    fn resolve(&self) -> anyhow::Result<OrganizerConfig> {
        let mut config = match &self.config {
            Some(path) => OrganizerConfig::load(path)?,
            None => OrganizerConfig::default(),
        };
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if let Some(scale) = self.scale {
            config.thumbnail_scale = scale;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditOp {
    Delete(usize),
    /// Blank page before the given position, or at the end.
    Blank(Option<usize>),
    Move(usize, usize),
}

impl FromStr for EditOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(|p| p.trim()).collect();
        let position = |p: &str| -> Result<usize, String> {
            match p.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(format!("Invalid page position '{}' in '{}'", p, s)),
            }
        };
        match parts.as_slice() {
            ["delete", pos] => Ok(EditOp::Delete(position(pos)?)),
            ["blank", "end"] => Ok(EditOp::Blank(None)),
            ["blank", pos] => Ok(EditOp::Blank(Some(position(pos)?))),
            ["move", from, to] => Ok(EditOp::Move(position(from)?, position(to)?)),
            _ => Err(format!(
                "Invalid edit '{}'. Use delete:<pos>, blank:<pos>, blank:end or move:<from>:<to>",
                s
            )),
        }
    }
}

type PdfSession = Session<PdfReader, PdfWriter>;

fn open_session(input: &str, settings: &Settings) -> anyhow::Result<PdfSession> {
    let config = settings.resolve()?;
    let mut session = Session::new(PdfReader::new(), PdfWriter::new(), config);
    let file = UploadedFile::from_path(input).with_context(|| format!("Failed to read {}", input))?;
    if let Err(e) = session.import(file) {
        let alert = match e {
            OrganizerError::InvalidFileType { .. } => TextKey::AlertValid,
            _ => TextKey::AlertError,
        };
        return Err(anyhow::Error::new(e).context(localize(alert, session.locale())));
    }
    Ok(session)
}

fn entry_at(session: &PdfSession, position: usize) -> anyhow::Result<EntryId> {
    match session.editor().sequence().at_display_position(position) {
        Some(entry) => Ok(entry.id()),
        None => bail!(
            "Page position {} out of range (document has {} pages)",
            position,
            session.editor().sequence().len()
        ),
    }
}

fn apply(session: &mut PdfSession, op: EditOp) -> anyhow::Result<()> {
    log::debug!("Applying {:?}", op);
    match op {
        EditOp::Delete(pos) => {
            let id = entry_at(session, pos)?;
            session.delete(id)?;
        }
        EditOp::Blank(Some(pos)) => {
            let id = entry_at(session, pos)?;
            session.insert_blank(Some(id))?;
        }
        EditOp::Blank(None) => {
            session.insert_blank(None)?;
        }
        EditOp::Move(from, to) => {
            let id = entry_at(session, from)?;
            session.move_entry(id, to)?;
        }
    }
    Ok(())
}

fn write_thumbnails(session: &PdfSession, dir: &Path) -> anyhow::Result<usize> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let tiles = session.tiles();
    tiles
        .par_iter()
        .enumerate()
        .filter_map(|(i, tile)| tile.thumbnail().map(|img| (i + 1, img)))
        .map(|(position, img)| {
            let path = dir.join(format!("page-{:03}.png", position));
            img.save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<()>>>()
        .map(|written| written.len())
}

fn run_tiles(input: &str, thumbs: Option<&Path>, settings: &Settings) -> anyhow::Result<()> {
    let session = open_session(input, settings)?;
    for tile in session.tiles() {
        println!("{}", tile.label);
    }
    if let Some(dir) = thumbs {
        let written = write_thumbnails(&session, dir)?;
        println!("Successfully wrote {} thumbnails to {}", written, dir.display());
    }
    Ok(())
}

fn run_edit(input: &str, output: Option<&str>, ops: &[EditOp], settings: &Settings) -> anyhow::Result<()> {
    let mut session = open_session(input, settings)?;
    for op in ops {
        apply(&mut session, *op)?;
    }
    let file = session.export().context("Failed to build the output PDF")?;
    let path = output.unwrap_or(file.file_name.as_str());
    file.save(path).with_context(|| format!("Failed to write {}", path))?;
    println!(
        "Successfully saved {} pages into {}",
        session.editor().sequence().len(),
        path
    );
    Ok(())
}

fn run_strings(locale: Option<Locale>) {
    let locales: Vec<Locale> = match locale {
        Some(l) => vec![l],
        None => Locale::ALL.to_vec(),
    };
    for locale in locales {
        for key in TextKey::ALL {
            println!("{}\t{}\t{}", locale, key.name(), localize(key, locale));
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match &cli.command {
        Commands::Tiles {
            input,
            thumbs,
            settings,
        } => run_tiles(input, thumbs.as_deref(), settings),
        Commands::Edit {
            input,
            output,
            ops,
            settings,
        } => run_edit(input, output.as_deref(), ops, settings),
        Commands::Strings { locale } => {
            run_strings(*locale);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit_ops() {
        assert_eq!("delete:2".parse::<EditOp>(), Ok(EditOp::Delete(2)));
        assert_eq!("blank:end".parse::<EditOp>(), Ok(EditOp::Blank(None)));
        assert_eq!("blank:1".parse::<EditOp>(), Ok(EditOp::Blank(Some(1))));
        assert_eq!("move:3:1".parse::<EditOp>(), Ok(EditOp::Move(3, 1)));
    }

    #[test]
    fn test_reject_bad_ops() {
        assert!("delete:0".parse::<EditOp>().is_err());
        assert!("delete".parse::<EditOp>().is_err());
        assert!("move:1".parse::<EditOp>().is_err());
        assert!("rotate:1".parse::<EditOp>().is_err());
    }
}
