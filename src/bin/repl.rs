//! Interactive driver: reads top-level forms, evaluates them against one
//! session, and prints results in canonical form.

use std::panic;
use std::process;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use boxeval::evaluator::Interpreter;
use boxeval::scheme::parse_form;
use boxeval::value::Value;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let result = panic::catch_unwind(run_repl);

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");
        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: unknown panic occurred");
        }
        process::exit(1);
    }
}

fn run_repl() {
    println!("boxeval - a small list-processing teaching language");
    println!("Enter top-level forms like: (define sq (lambda (x) (* x x)))");
    println!("Type :help for commands, or Ctrl+C to exit.");
    println!();

    let Ok(mut rl) = DefaultEditor::new() else {
        eprintln!("Could not initialize the line editor.");
        process::exit(1);
    };
    let interp = Interpreter::new();

    loop {
        match rl.readline("boxeval> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(&interp);
                        continue;
                    }
                    ":reset" => {
                        interp.reset();
                        println!("Session reset.");
                        continue;
                    }
                    _ => {}
                }

                match parse_form(line).and_then(|form| interp.eval_form(&form)) {
                    // Definitions and assignments are silent, like their
                    // side effects.
                    Ok(Value::Void) => {}
                    Ok(value) => println!("{value}"),
                    Err(error) => println!("Error: {error}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye.");
                break;
            }
            Err(error) => {
                eprintln!("Readline error: {error}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help   show this help");
    println!("  :env    list the global environment's bindings");
    println!("  :reset  clear the session (bindings and identity counters)");
    println!();
    println!("Anything else is parsed as one top-level form and evaluated:");
    println!("  (define x 1)");
    println!("  (let ((y 2)) (+ x y))");
    println!("  (letrec ((fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))) (fact 5))");
}

fn print_environment(interp: &Interpreter) {
    let bindings = interp.global().bindings();
    if bindings.is_empty() {
        println!("(no global bindings)");
        return;
    }
    for (name, value) in bindings {
        println!("  {name} = {value}");
    }
}
