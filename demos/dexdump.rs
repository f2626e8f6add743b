use dexview::dex::{ClassData, DexClass, DexFile};
use std::env;
use std::error::Error;
use std::path::Path;

//Usage: dexdump <classes.dex>
fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: dexdump <classes.dex>");
        return;
    }

    // Do everything else with the error trap
    match process_dex(&args[1]) {
        Ok(_) => {}
        Err(e) => {
            println!("Aborted due to error: {}", e);
        }
    }
}

/* Print every class; a class that fails to decode is reported and skipped */
fn process_dex(dex_file: &str) -> Result<(), Box<dyn Error>> {
    let dex = DexFile::from_file(Path::new(dex_file))?;

    let header = dex.header();
    println!("version {:?}, {} strings, {} types, {} classes",
        header.version(), header.string_ids.size, header.type_ids.size, header.class_defs.size);
    for w in dex.warnings() {
        println!("warning: {}", w);
    }

    for class in dex.classes() {
        match class.parse_data(&dex) {
            Ok(data) => print_class(class, data),
            Err(e) => println!("\nclass {} skipped: {}", class.name, e),
        }
    }

    Ok(())
}

fn print_class(class: &DexClass, data: &ClassData) {
    println!("\nclass {} ({:?})", class.name, class.access);
    if let Some(sup) = &class.superclass {
        println!("  extends {}", sup);
    }
    for i in &class.interfaces {
        println!("  implements {}", i);
    }

    for f in &data.fields {
        match &f.constant_value {
            Some(v) => println!("  field {} = {:?}", f.id.member, v),
            None => println!("  field {}", f.id.member),
        }
    }

    for m in &data.methods {
        match &m.code {
            Some(code) => {
                println!("  method {} registers={} ins={} outs={} insns={}",
                    m.id.member, code.registers_size, code.ins_size, code.outs_size, code.bytecode.len());
                for t in &code.tries {
                    let catches: Vec<String> = t.catches.iter()
                        .map(|c| format!("{}@{}", c.exception_type, c.addr))
                        .collect();
                    println!("    try {}..{} catch {}", t.start_addr, t.end_addr(), catches.join(", "));
                }
            }
            None => println!("  method {} (no code)", m.id.member),
        }
    }
}
