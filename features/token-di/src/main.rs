use std::{error::Error, rc::Rc};

use token_di::{
    container, implementation, inject, provide, run_in_scope, token, token_with_default,
    use_injection, Dependencies,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Greeting {
    text: String,
}

#[derive(Debug)]
struct Greeter {
    greeting: Rc<Greeting>,
    name: Rc<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let greeting = token_with_default("Greeting", Greeting { text: "Hello".into() });
    let name = token::<String>("Name");
    let greeter = token::<Greeter>("Greeter");

    let greeter_impl = inject(Dependencies::new().add("greeting", &greeting).add("name", &name))
        .implements(&greeter, |ctx| {
            Ok(Greeter {
                greeting: ctx.get("greeting")?,
                name: ctx.get("name")?,
            })
        })
        .with_disposer(|greeter| {
            tracing::info!("Goodbye {}", greeter.name);
            Ok(())
        });

    let root = container([provide::stateful(implementation(&name, "world".to_string()))])?;
    let session = root.fork([provide::stateful(greeter_impl)])?;

    let instance = run_in_scope(&session, || use_injection(&greeter))?;
    println!("{}, {}!", instance.greeting.text, instance.name);
    println!("{:?}", session);

    // Disposes the session as well
    root.dispose()?;
    Ok(())
}
