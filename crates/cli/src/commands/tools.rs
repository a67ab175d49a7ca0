//! `crewflow tools`: list the built-in tools.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = crewflow_tools::default_registry();
    println!("Built-in tools ({}):", registry.len());
    println!();
    for spec in registry.specs() {
        println!("  {:<22} {}", spec.name, spec.description);
        for param in &spec.parameters {
            println!("  {:<22}   {}: {}", "", param.name, param.kind);
        }
    }
    println!();
    println!("Signatures as shown to the model:");
    println!("{}", registry.signatures());
    Ok(())
}
