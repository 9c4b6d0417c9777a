use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;

use wasmith::expr::{ConstExpr, ExprBuilder};
use wasmith::instruction::{Instruction, MemArg};
use wasmith::module::{Function, Module};
use wasmith::types::{FuncType, Limits, ValueType};

#[derive(Parser)]
#[command(name = "wasmith")]
#[command(about = "WebAssembly module assembler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an empty module (8-byte preamble only)
    Empty {
        /// Output path for the .wasm file
        output: String,
    },

    /// Write a WASI module that prints "hello world" via fd_write
    Hello {
        /// Output path for the .wasm file
        output: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (path, bytes) = match cli.command {
        Commands::Empty { output } => (output, Module::new().assemble()),
        Commands::Hello { output } => match hello_module() {
            Ok(bytes) => (output, bytes),
            Err(e) => {
                eprintln!("Error assembling module: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    if let Err(e) = fs::write(&path, &bytes) {
        eprintln!("Error writing {}: {}", path, e);
        return ExitCode::FAILURE;
    }
    println!("wrote {} ({} bytes)", path, bytes.len());
    ExitCode::SUCCESS
}

/// The classic WASI hello world: one iovec at address 8 pointing at the
/// string, `fd_write` to stdout from `_start`.
fn hello_module() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut module = Module::new();

    let fd_write_type = module.func_type(FuncType::new(
        [ValueType::I32, ValueType::I32, ValueType::I32, ValueType::I32],
        [ValueType::I32],
    ));
    let fd_write = module.import_func("wasi_unstable", "fd_write", fd_write_type)?;

    let memory = module.memory(Limits::at_least(1))?;
    module.export_memory("memory", memory)?;

    let text = b"hello world\n";
    module.active_data(text.to_vec(), ConstExpr::I32(8))?;

    let start_type = module.func_type(FuncType::new([], []));
    let mut body = ExprBuilder::new();
    // iovec { base = 8, len = 12 } at address 0
    body.emit(Instruction::I32Const { value: 0 })?
        .emit(Instruction::I32Const { value: 8 })?
        .emit(Instruction::I32Store { memarg: MemArg::new(2, 0) })?
        .emit(Instruction::I32Const { value: 4 })?
        .emit(Instruction::I32Const { value: text.len() as i32 })?
        .emit(Instruction::I32Store { memarg: MemArg::new(2, 0) })?
        // fd_write(stdout, iovs = 0, iovs_len = 1, nwritten = 20)
        .emit(Instruction::I32Const { value: 1 })?
        .emit(Instruction::I32Const { value: 0 })?
        .emit(Instruction::I32Const { value: 1 })?
        .emit(Instruction::I32Const { value: 20 })?
        .emit(Instruction::Call { func_idx: fd_write })?
        .emit(Instruction::Drop)?;

    let start = module.function(Function::new(start_type, body.finish()?))?;
    module.export_func("_start", start)?;

    Ok(module.assemble())
}
