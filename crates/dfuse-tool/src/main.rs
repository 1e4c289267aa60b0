use std::{
    io::{Write, stdout},
    path::{Path, PathBuf},
};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use clap_num::maybe_hex;
use colored::Colorize;
use dfuse_builder::{
    DEFAULT_ADDRESS, DEFAULT_ALT_SETTING, DEFAULT_DEVICE, DEFAULT_DFU_VERSION, DEFAULT_NAME,
    DEFAULT_PRODUCT, DEFAULT_VENDOR, DfuImage, HLEncoder, Metadata, checksum,
};

use crate::{
    err::Error,
    output::{DFU_DIR, WriteMode},
    upload::DfuUtil,
};

mod err;
mod logging;
mod output;
mod upload;

type Result<T> = core::result::Result<T, Error>;

const DEFAULT_BIN: &str = ".pio/build/midi_dfu/firmware.bin";

#[derive(Args)]
struct ImageArgs {
    /// Flash load address
    #[arg(long, default_value_t = DEFAULT_ADDRESS, value_parser=maybe_hex::<u32>)]
    address: u32,
    /// DFU alternate setting number
    #[arg(long, default_value_t = DEFAULT_ALT_SETTING, value_parser=maybe_hex::<u8>)]
    alt: u8,
    /// USB vendor ID
    #[arg(long, default_value_t = DEFAULT_VENDOR, value_parser=maybe_hex::<u16>)]
    vendor: u16,
    /// USB product ID
    #[arg(long, default_value_t = DEFAULT_PRODUCT, value_parser=maybe_hex::<u16>)]
    product: u16,
    /// USB device version
    #[arg(long, default_value_t = DEFAULT_DEVICE, value_parser=maybe_hex::<u16>)]
    device: u16,
    /// bcdDFU version stored in the suffix
    #[arg(long, default_value_t = DEFAULT_DFU_VERSION, value_parser=maybe_hex::<u16>)]
    dfu_version: u16,
    /// Target name stored in the DFU descriptor
    #[arg(long, default_value = DEFAULT_NAME)]
    name: String,
}

impl From<ImageArgs> for Metadata {
    fn from(args: ImageArgs) -> Self {
        Self {
            address: args.address,
            alt_setting: args.alt,
            name: args.name,
            vendor: args.vendor,
            product: args.product,
            device: args.device,
            dfu_version: args.dfu_version,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Wrap a raw firmware binary into a DfuSe file
    Pack {
        /// Firmware binary
        #[arg(long, default_value = DEFAULT_BIN)]
        bin: PathBuf,
        /// Output DFU path, defaults to artifacts/dfu/platformio-<timestamp>.dfu
        #[arg(long)]
        out: Option<PathBuf>,
        /// Allow overwriting the output file if it already exists
        #[arg(long)]
        overwrite: bool,
        #[command(flatten)]
        image: ImageArgs,
    },
    /// Package a freshly built binary and update platformio-latest.dfu
    PostBuild {
        /// Firmware binary produced by the build
        #[arg(long)]
        bin: PathBuf,
        /// Project root holding the artifacts directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
        #[command(flatten)]
        image: ImageArgs,
    },
    /// Flash a DfuSe file with dfu-util
    Upload {
        /// dfu-util executable
        #[arg(long, env = "DFUUTIL")]
        dfu_util: Option<String>,
        /// DFU alternate setting number
        #[arg(long, default_value_t = DEFAULT_ALT_SETTING, value_parser=maybe_hex::<u8>)]
        alt: u8,
        /// DFU file, defaults to the latest post-build image
        #[arg(long)]
        file: Option<PathBuf>,
        /// Project root holding the artifacts directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the image that would be built from a binary
    Info {
        /// Firmware binary
        #[arg(long, default_value = DEFAULT_BIN)]
        bin: PathBuf,
        #[command(flatten)]
        image: ImageArgs,
    },
}

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn pack(bin: &Path, out: &Path, mode: WriteMode, metadata: &Metadata) -> Result<()> {
    log!("Packaging {} ", bin.display());
    let len = status!(output::package(bin, out, mode, metadata))?;
    println!("Wrote {} ({} bytes)", out.display(), len);
    Ok(())
}

fn post_build(bin: &Path, project_dir: &Path, metadata: &Metadata) -> Result<()> {
    let dir = project_dir.join(DFU_DIR);
    let out = output::timestamped_path(&dir, &Local::now());

    println!("[post-build] Generating {}", out.display());
    pack(bin, &out, WriteMode::Overwrite, metadata)?;
    let latest = output::update_latest(&out, &dir)?;
    println!("[post-build] Updated {}", latest.display());

    Ok(())
}

fn info(bin: &Path, metadata: &Metadata) -> Result<()> {
    let payload = output::read_payload(bin)?;
    let image = DfuImage::from_metadata(&payload, metadata);
    println!("{image}");

    let bytes = image.to_bytes()?;
    if let Some(crc) = checksum::stored_crc(&bytes) {
        println!("CRC: {crc:#010X}");
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Pack {
            bin,
            out,
            overwrite,
            image,
        } => {
            let out = out.unwrap_or_else(|| {
                output::timestamped_path(Path::new(DFU_DIR), &Local::now())
            });
            pack(&bin, &out, overwrite.into(), &image.into())?;
        }

        Command::PostBuild {
            bin,
            project_dir,
            image,
        } => post_build(&bin, &project_dir, &image.into())?,

        Command::Upload {
            dfu_util,
            alt,
            file,
            project_dir,
            dry_run,
        } => {
            let dfu_util = DfuUtil::resolve(dfu_util.as_deref(), alt);
            let file = file.unwrap_or_else(|| upload::default_file(&project_dir));
            if dry_run {
                println!("{}", dfu_util.command_line(&file));
            } else {
                println!("Flashing {}", file.display());
                dfu_util.download(&file)?;
                println!("{}", "Done".green());
            }
        }

        Command::Info { bin, image } => info(&bin, &image.into())?,
    }

    Ok(())
}
