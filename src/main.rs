//! CARDIAC Emulator - CLI Entry Point
//!
//! Commands:
//! - `cardiac-emu run <program>` - Boot and run an ASM or card image file
//! - `cardiac-emu debug <program>` - Interactive debugger
//! - `cardiac-emu asm <source>` - Assemble to a card image
//! - `cardiac-emu disasm <deck>` - Disassemble a card image

use cardiac::{CardImage, ExhaustionPolicy, MachineConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::Path;

#[derive(Parser)]
#[command(name = "cardiac-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An emulator and assembler for the CARDIAC (1968) cardboard computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot a program through the card loader and run it until it halts
    Run {
        /// Path to the ASM or card image (.cdc) file to execute
        program: String,
        #[command(flatten)]
        machine: MachineArgs,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Print one JSON snapshot per cycle instead of the text trace
        #[arg(long)]
        trace_json: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        dump_state: bool,
        /// Write the output cards to a deck file
        #[arg(long)]
        output_file: Option<String>,
    },
    /// Interactive debugger
    Debug {
        /// Path to the ASM or card image file to debug
        program: String,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Assemble source to a card image
    Asm {
        /// Path to the source file
        source: String,
        /// Output card image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a card image to readable text
    Disasm {
        /// Path to the card image file
        deck: String,
    },
}

#[derive(clap::Args)]
struct MachineArgs {
    /// Input cards, appended after the program image
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    input: Vec<String>,
    /// Deck file with input cards, read after any --input cards
    #[arg(long)]
    input_file: Option<String>,
    /// JSON machine configuration file
    #[arg(short, long)]
    config: Option<String>,
    /// Number of memory cells
    #[arg(long)]
    memory_size: Option<usize>,
    /// What to do when INP finds no more cards
    #[arg(long, value_enum)]
    on_exhausted: Option<Policy>,
    /// Maximum number of cycles to run
    #[arg(short, long)]
    max_cycles: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Stop with an error
    Abort,
    /// Reset the registers and stop normally
    Reset,
}

impl From<Policy> for ExhaustionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Abort => ExhaustionPolicy::Abort,
            Policy::Reset => ExhaustionPolicy::Reset,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, machine, trace, trace_json, dump_state, output_file }) => {
            run_program(&program, &machine, trace, trace_json, dump_state, output_file);
        }
        Some(Commands::Debug { program, machine }) => {
            debug_program(&program, &machine);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { deck }) => {
            disassemble_file(&deck);
        }
        None => {
            println!("CARDIAC Emulator v0.1.0");
            println!("A decimal cardboard computer emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Print an error and exit.
fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

/// Resolve the machine configuration: config file first, then flags.
fn machine_config(args: &MachineArgs) -> MachineConfig {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .unwrap_or_else(|e| fail(format!("Failed to read config: {}", e)));
            serde_json::from_str(&text)
                .unwrap_or_else(|e| fail(format!("Invalid config {}: {}", path, e)))
        }
        None => MachineConfig::default(),
    };

    if let Some(size) = args.memory_size {
        config.memory_size = size;
    }
    if let Some(policy) = args.on_exhausted {
        config.on_input_exhausted = policy.into();
    }
    if args.max_cycles.is_some() {
        config.max_cycles = args.max_cycles;
    }

    if let Err(e) = cardiac::Memory::check_size(config.memory_size) {
        fail(format!("Invalid machine config: {}", e));
    }

    config
}

/// Collect the input cards that follow the program image.
fn input_cards(args: &MachineArgs) -> Vec<String> {
    let mut cards = args.input.clone();
    if let Some(path) = &args.input_file {
        match cardiac::asm::load_deck(path) {
            Ok(deck) => cards.extend(deck),
            Err(e) => fail(format!("Failed to load input deck: {}", e)),
        }
    }
    cards
}

/// Load a program, assembling it first if it is an ASM file.
fn load_program(path: &str) -> CardImage {
    if path.ends_with(".asm") {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));

        match cardiac::assemble(&source) {
            Ok(assembly) => {
                println!("📝 Assembled {} cards, start address {:02}", assembly.image.len(), assembly.start_address);
                assembly.image
            }
            Err(e) => fail(format!("Assembly error: {}", e)),
        }
    } else {
        match cardiac::asm::load_image(path) {
            Ok(image) => {
                println!("📂 Loaded {} cards", image.len());
                image
            }
            Err(e) => fail(format!("Failed to load card image: {}", e)),
        }
    }
}

fn run_program(
    path: &str,
    args: &MachineArgs,
    trace: bool,
    trace_json: bool,
    dump_state: bool,
    output_file: Option<String>,
) {
    use cardiac::{Cpu, IoPort, StopReason};

    println!("🔧 Running: {}", path);

    let image = load_program(path);
    let config = machine_config(args);

    let mut cpu = Cpu::with_config(&config);
    cpu.io.push_input(input_cards(args));
    cpu.boot(&image);

    println!();
    println!("━━━ Execution ━━━");

    let result = cpu.run_traced(config.max_cycles, |snap| {
        if trace_json {
            match serde_json::to_string(snap) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("⚠️  Failed to encode trace: {}", e),
            }
        } else if trace {
            println!("{:02}: {:<8} ACC={:<6} PC={:02} NEXT IN={}",
                snap.address, snap.instruction.to_string(), snap.registers.acc, snap.registers.pc,
                snap.next_input.as_deref().unwrap_or("-"));
        }
    });

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => fail(format!("CPU error at PC={:02}: {}", cpu.regs.pc, e)),
    };

    println!();
    println!("━━━ Output ━━━");
    for card in cpu.io.output() {
        println!("{}", card);
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", summary.cycles);
    println!("Stop:   {:?}", summary.reason);
    println!("ACC:    {}", cpu.regs.acc);
    println!("PC:     {:02}", cpu.regs.pc);

    if let Some(out_path) = output_file {
        match cardiac::asm::save_deck(&out_path, cpu.io.output()) {
            Ok(()) => println!("💾 Output cards saved to {}", out_path),
            Err(e) => fail(format!("Failed to save output deck: {}", e)),
        }
    }

    if dump_state {
        match serde_json::to_string_pretty(&cpu) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(format!("Failed to encode state: {}", e)),
        }
    }

    if summary.reason == StopReason::CycleLimit {
        println!();
        println!("⚠️  Reached max cycles limit. Use --max-cycles to increase.");
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, args: &MachineArgs) {
    println!("🔍 Loading: {}", path);

    let image = load_program(path);
    let config = machine_config(args);
    let input = input_cards(args);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = cardiac::run_debugger(image, input, config) {
        fail(format!("Debugger error: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _args: &MachineArgs) {
    fail("the debugger requires the `tui` feature");
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = output.unwrap_or_else(|| image_path(source_path));
    if Path::new(&out_path) == Path::new(source_path) {
        fail(format!("Refusing to overwrite source {} with its card image; pass -o", source_path));
    }

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));

    let assembly = match cardiac::assemble(&source) {
        Ok(assembly) => assembly,
        Err(e) => fail(format!("Assembly error: {}", e)),
    };

    println!("✓ Assembled {} cards, start address {:02}", assembly.image.len(), assembly.start_address);
    for (label, address) in &assembly.symbols {
        println!("  {:<10} {:02}", label, address);
    }

    if let Err(e) = cardiac::asm::save_image(&out_path, &assembly.image) {
        fail(format!("Failed to save card image: {}", e));
    }

    println!("✓ Saved to {}", out_path);
}

/// Default card image path for a source file: same stem, `.cdc` extension.
fn image_path(source_path: &str) -> String {
    Path::new(source_path).with_extension("cdc").to_string_lossy().into_owned()
}

fn disassemble_file(deck_path: &str) {
    use cardiac::Memory;

    println!("📖 Disassembling: {}", deck_path);
    println!();

    let image = match cardiac::asm::load_image(deck_path) {
        Ok(image) => image,
        Err(e) => fail(format!("Failed to load card image: {}", e)),
    };

    let mut mem = Memory::new();
    if let Err(e) = image.load_into(&mut mem) {
        fail(format!("Failed to load card image: {}", e));
    }

    println!("{}", cardiac::disassemble(&mem, 0..mem.size() + 1));
    if let Some(start) = image.entry_point() {
        println!("; start address {:02}", start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_path() {
        assert_eq!(image_path("prog.asm"), "prog.cdc");
        assert_eq!(image_path("p/prog.txt"), "p/prog.cdc");
        assert_eq!(image_path("lib.asm/prog"), "lib.asm/prog.cdc");
        assert_eq!(image_path("prog"), "prog.cdc");
    }

    #[test]
    fn test_image_path_never_overwrites_source() {
        for source in ["prog.cdc.asm", "demos/add.asm", "notes.txt"] {
            assert_ne!(image_path(source), source);
        }
    }
}
