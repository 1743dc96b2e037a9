/*
 *
 *  * // Copyright (c) 2023 Huawei Technologies Co.,Ltd. All rights reserved.
 *  * //
 *  * // signatrust is licensed under Mulan PSL v2.
 *  * // You can use this software according to the terms and conditions of the Mulan
 *  * // PSL v2.
 *  * // You may obtain a copy of Mulan PSL v2 at:
 *  * //         http://license.coscl.org.cn/MulanPSL2
 *  * // THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
 *  * // KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
 *  * // NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
 *  * // See the Mulan PSL v2 for more details.
 *
 */
use bootkit::loader::{load_entry, load_many};
use bootkit::shim::{read_vendor_db, set_vendor_db, set_vendor_db_at};
use bootkit::uki::{compose_with, UkiLayout, DEFAULT_SBAT};
use bootkit::vars::SecureBootKeys;
use bootkit::{pem_to_p7, DigestAlgorithm, EfiImage, SignatureDatabase, SignedOutput, Signer};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use std::env;
use std::fs::read;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{self, ExitStatus};

#[derive(Parser)]
#[command(name = "bootkit examples")]
#[command(author = "Li chaoran <pkwarcraft@gmail.com>")]
#[command(version = "0.1")]
#[command(about = "Assemble and sign secure boot artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    #[arg(help = "print more info")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Parse a EFI image", long_about = None)]
    Parse(Parse),
    #[command(about = "Sign a EFI image with key and cert", long_about = None)]
    Sign(Sign),
    #[command(about = "Convert pem to p7b", long_about = None)]
    P7b(P7b),
    #[command(about = "Build a unified kernel image from a stub", long_about = None)]
    Smoosh(Smoosh),
    #[command(about = "Replace the vendor db of a shim", long_about = None)]
    VendorDb(VendorDb),
    #[command(about = "Print the vendor db of a shim", long_about = None)]
    ShowVendorDb(Parse),
    #[command(about = "Print the virt-fw-vars command enrolling keys", long_about = None)]
    OvmfArgs(OvmfArgs),
}

#[derive(Args)]
struct Parse {
    #[arg(help = "EFI image path to parse")]
    path: PathBuf,
}

#[derive(Args)]
struct Sign {
    #[arg(long, short, required(true))]
    #[arg(help = "private key in pem format")]
    key: PathBuf,
    #[arg(long, short, required(true))]
    #[arg(help = "certificate or pkcs7 bundle in pem format")]
    cert: PathBuf,
    #[arg(long, value_enum)]
    #[arg(help = "digest algorithm, an existing signature's algorithm wins")]
    digest: Option<Digest>,
    #[arg(help = "EFI image path to sign")]
    path: PathBuf,
    #[arg(help = "output path, defaults to <path>.signed")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct P7b {
    #[arg(help = "pem cert to convert")]
    path: PathBuf,
    #[arg(help = "p7b output file path")]
    output: PathBuf,
}

#[derive(Args)]
struct Smoosh {
    #[arg(long, required(true))]
    stub: PathBuf,
    #[arg(long, required(true))]
    kernel: PathBuf,
    #[arg(long, required(true))]
    initrd: PathBuf,
    #[arg(long, default_value = "")]
    cmdline: String,
    #[arg(long)]
    #[arg(help = "sbat file, the built-in sbat is used when absent")]
    sbat: Option<PathBuf>,
    output: PathBuf,
}

#[derive(Args)]
struct VendorDb {
    #[arg(long)]
    #[arg(help = "key directories for db, each holding cert.pem and guid")]
    db: Vec<PathBuf>,
    #[arg(long)]
    #[arg(help = "key directories for dbx")]
    dbx: Vec<PathBuf>,
    #[arg(long, value_parser = parse_hex)]
    #[arg(help = "virtual address of .vendor_cert, defaults to the existing one")]
    vma: Option<u32>,
    shim: PathBuf,
}

#[derive(Args)]
struct OvmfArgs {
    #[arg(long, required(true))]
    pk: PathBuf,
    #[arg(long)]
    kek: Vec<PathBuf>,
    #[arg(long)]
    db: Vec<PathBuf>,
    #[arg(long)]
    mok: Vec<PathBuf>,
    input: PathBuf,
    output: PathBuf,
}

fn parse_hex(s: &str) -> Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Digest {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl From<Digest> for DigestAlgorithm {
    fn from(d: Digest) -> Self {
        match d {
            Digest::Sha1 => DigestAlgorithm::SHA1,
            Digest::Sha256 => DigestAlgorithm::SHA2_256,
            Digest::Sha384 => DigestAlgorithm::SHA2_384,
            Digest::Sha512 => DigestAlgorithm::SHA2_512,
        }
    }
}

fn check_status(status: io::Result<ExitStatus>) -> Result<(), String> {
    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(s) => Err(format!("{} failed: {}", bootkit::vars::VIRT_FW_VARS, s)),
        Err(e) => Err(format!("failed to run {}: {}", bootkit::vars::VIRT_FW_VARS, e)),
    }
}

fn parse(p: Parse) {
    let buf = read(&p.path).unwrap();
    let pe = EfiImage::parse(&buf).unwrap();
    pe.print_info().unwrap();
    println!("{} signatures", pe.signatures.len());
}

fn sign(s: Sign) {
    let mut signer = Signer::from_files(&s.cert, &s.key).unwrap();
    if let Some(d) = s.digest {
        signer = signer.with_algorithm(d.into());
    }
    let output = match s.output {
        Some(p) => SignedOutput::Path(p),
        None => SignedOutput::Sibling,
    };
    let written = signer.sign_file(&s.path, &output).unwrap();

    let buf = read(&written).unwrap();
    let new_pe = EfiImage::parse(&buf).unwrap();
    new_pe.print_info().unwrap();
    new_pe.verify().unwrap();
    println!("signed {}", written.display());
}

fn p7b(p: P7b) {
    let pem_file_content = read(&p.path).unwrap();
    debug!("read cert: {}", String::from_utf8_lossy(&pem_file_content));

    let p7 = pem_to_p7(&pem_file_content).unwrap();
    let mut file = std::fs::File::create(&p.output).unwrap();
    file.write_all(&p7).unwrap();
}

fn smoosh(s: Smoosh) {
    let sbat = match s.sbat {
        Some(p) => String::from_utf8(read(p).unwrap()).unwrap(),
        None => DEFAULT_SBAT.to_string(),
    };
    compose_with(
        &UkiLayout::default(),
        &s.stub,
        &s.output,
        &s.cmdline,
        &sbat,
        &s.kernel,
        &s.initrd,
    )
    .unwrap();
}

fn vendor_db(v: VendorDb) {
    let db = load_many(&v.db).unwrap();
    let dbx = if v.dbx.is_empty() {
        SignatureDatabase::new()
    } else {
        load_many(&v.dbx).unwrap()
    };
    match v.vma {
        Some(vma) => set_vendor_db_at(&v.shim, vma, &db, &dbx).unwrap(),
        None => set_vendor_db(&v.shim, &db, &dbx).unwrap(),
    }
}

fn show_vendor_db(p: Parse) {
    let table = read_vendor_db(&p.path).unwrap();
    for (name, db) in [("db", &table.db), ("dbx", &table.dbx)] {
        for entry in db.entries() {
            println!("{} {} {} bytes", name, entry.owner, entry.data.len());
        }
    }
}

fn ovmf_args(o: OvmfArgs) {
    let mut keys = SecureBootKeys::new(load_entry(&o.pk).unwrap());
    keys.kek = o.kek.iter().map(|d| load_entry(d).unwrap()).collect();
    keys.db = o.db.iter().map(|d| load_entry(d).unwrap()).collect();
    keys.mok = o.mok.iter().map(|d| load_entry(d).unwrap()).collect();
    let prepared = keys.prepare(&o.input, &o.output).unwrap();
    println!("{:?}", prepared.command());
    // the staged certificates go away with `prepared`
    if let Err(e) = check_status(prepared.command().status()) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn main() {
    //prepare config and logger
    let app = Cli::parse();
    if app.verbose {
        println!("debug enabled");
        env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    match app.command {
        Commands::Parse(p) => parse(p),
        Commands::Sign(s) => sign(s),
        Commands::P7b(p) => p7b(p),
        Commands::Smoosh(s) => smoosh(s),
        Commands::VendorDb(v) => vendor_db(v),
        Commands::ShowVendorDb(p) => show_vendor_db(p),
        Commands::OvmfArgs(o) => ovmf_args(o),
    }
}
