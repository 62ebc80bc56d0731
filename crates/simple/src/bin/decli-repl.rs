//! Interactive demo shell for the command framework.
//!
//! Reads lines from stdin and dispatches them. Prefix a line with `?` to see
//! completions instead of executing it.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use decli_core::argument::EnumTable;
use decli_core::declare::{LeafDeclaration, ParameterDeclaration};
use decli_core::{Flag, KeyedArguments, NamedArg, ParentDeclaration};
use decli_simple::SimpleManager;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone)]
enum Material {
    Stone,
    Wood,
    Iron,
}

fn main() -> Result<()> {
    init_tracing();

    let mut manager: SimpleManager<()> = SimpleManager::new(|_, message| println!("{message}"));
    register_demo_commands(&mut manager)?;

    println!("decli demo shell. Try `greet`, `give stone 3`, `copy -v out:target src`.");
    println!("Prefix with `?` for completions, `exit` to quit.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let line = line.trim_end();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            _ if line.starts_with('?') => {
                let partial = &line[1..];
                let suggestions = manager.suggest_line(&(), partial);
                if suggestions.is_empty() {
                    println!("(no completions)");
                } else {
                    println!("{}", suggestions.join("  "));
                }
            }
            _ => {
                if let Err(error) = manager.execute_line(&(), line) {
                    eprintln!("error: {error:#}");
                }
            }
        }
    }
    Ok(())
}

fn register_demo_commands(manager: &mut SimpleManager<()>) -> Result<()> {
    manager.register(
        ParentDeclaration::new("greet").leaf(
            LeafDeclaration::default(|_, mut invocation| {
                let name = invocation
                    .take::<String>(0)
                    .unwrap_or_else(|| "world".to_string());
                println!("Hello, {name}!");
                Ok(())
            })
            .parameter(ParameterDeclaration::of::<String>("name").optional()),
        ),
    )?;

    manager.register(
        ParentDeclaration::new("give").leaf(
            LeafDeclaration::default(|_, mut invocation| {
                let material = invocation
                    .take::<Material>(0)
                    .ok_or_else(|| anyhow::anyhow!("missing material"))?;
                let amount = invocation.take::<i32>(1).unwrap_or(1);
                println!("Giving {amount} x {material:?}");
                Ok(())
            })
            .parameter(ParameterDeclaration::enumeration(
                "material",
                EnumTable::new([
                    ("STONE", Material::Stone),
                    ("WOOD", Material::Wood),
                    ("IRON", Material::Iron),
                ]),
            ))
            .parameter(ParameterDeclaration::of::<i32>("amount").optional()),
        ),
    )?;

    manager.register(
        ParentDeclaration::new("copy").leaf(
            LeafDeclaration::default(|_, mut invocation| {
                let args = invocation
                    .take::<KeyedArguments>(0)
                    .ok_or_else(|| anyhow::anyhow!("missing arguments"))?;
                println!(
                    "copy: sources=[{}] out={:?} verbose={}",
                    args.text_with(", "),
                    args.argument::<String>("out"),
                    args.has_flag("v"),
                );
                Ok(())
            })
            .parameter(
                ParameterDeclaration::keyed("args")
                    .flags(vec![
                        Flag::short("v").long("verbose").build(),
                        Flag::short("f").long("force").build(),
                    ])
                    .named(vec![NamedArg::of::<String>("out").build()]),
            ),
        ),
    )?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
