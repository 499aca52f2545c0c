//! The instruction set executed by processes.
//!
//! Instructions are built once, with every argument already classified
//! as a variable name or an integer literal. `FOR` only exists at
//! construction time: [`flatten`] expands it into its repeated body, so
//! the interpreter never sees a loop.

use std::collections::HashMap;
use std::fmt::{self, Display};

/// An instruction argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// An integer literal, already reduced modulo 65536.
    Literal(u16),
    /// A variable name. Undeclared variables read as 0.
    Var(String),
}

impl Operand {
    /// Classifies a textual argument.
    ///
    /// Anything that parses as an integer is a literal; everything else
    /// names a variable.
    pub fn parse(arg: &str) -> Operand {
        match arg.trim().parse::<i64>() {
            Ok(value) => Operand::Literal(value.rem_euclid(1 << 16) as u16),
            Err(_) => Operand::Var(arg.trim().to_string()),
        }
    }

    pub fn var(name: impl Into<String>) -> Operand {
        Operand::Var(name.into())
    }

    pub fn resolve(&self, memory: &HashMap<String, u16>) -> u16 {
        match self {
            Operand::Literal(value) => *value,
            Operand::Var(name) => memory.get(name).copied().unwrap_or(0),
        }
    }
}

impl From<u16> for Operand {
    fn from(value: u16) -> Self {
        Operand::Literal(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Literal(value.rem_euclid(1 << 16) as u16)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Var(name) => write!(f, "{}", name),
        }
    }
}

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `DECLARE var [value]`
    Declare { var: String, value: Operand },

    /// `ADD dst lhs rhs`
    Add { dst: String, lhs: Operand, rhs: Operand },

    /// `SUBTRACT dst lhs rhs`
    Subtract { dst: String, lhs: Operand, rhs: Operand },

    /// `PRINT word...`
    ///
    /// Words naming a declared variable print its value.
    Print { words: Vec<String> },

    /// `SLEEP ticks`
    Sleep { ticks: Operand },

    /// `FOR repeats { body }`, expanded before execution.
    For { repeats: u16, body: Vec<Instruction> },

    /// An operation that could not be understood. Executes as a no-op.
    Unknown { op: String, args: Vec<String> },
}

impl Instruction {
    pub fn declare(var: impl Into<String>, value: impl Into<Operand>) -> Instruction {
        Instruction::Declare {
            var: var.into(),
            value: value.into(),
        }
    }

    pub fn add(dst: impl Into<String>, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Instruction {
        Instruction::Add {
            dst: dst.into(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn subtract(dst: impl Into<String>, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Instruction {
        Instruction::Subtract {
            dst: dst.into(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn print(text: &str) -> Instruction {
        Instruction::Print {
            words: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn sleep(ticks: impl Into<Operand>) -> Instruction {
        Instruction::Sleep {
            ticks: ticks.into(),
        }
    }

    /// Builds an instruction from its textual operation and arguments.
    ///
    /// `DECLARE` without a value declares 0. Any other missing operand,
    /// and any unknown operation, yields [`Instruction::Unknown`].
    pub fn parse<S: AsRef<str>>(op: &str, args: &[S]) -> Instruction {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        match (op.to_ascii_uppercase().as_str(), args.as_slice()) {
            ("DECLARE", [var]) => Instruction::declare(*var, 0),
            ("DECLARE", [var, value, ..]) => Instruction::declare(*var, Operand::parse(value)),
            ("ADD", [dst, lhs, rhs, ..]) => {
                Instruction::add(*dst, Operand::parse(lhs), Operand::parse(rhs))
            }
            ("SUBTRACT", [dst, lhs, rhs, ..]) => {
                Instruction::subtract(*dst, Operand::parse(lhs), Operand::parse(rhs))
            }
            ("PRINT", words) => Instruction::Print {
                words: words.iter().map(|word| word.to_string()).collect(),
            },
            ("SLEEP", [ticks, ..]) => Instruction::sleep(Operand::parse(ticks)),
            _ => Instruction::Unknown {
                op: op.to_string(),
                args: args.iter().map(|arg| arg.to_string()).collect(),
            },
        }
    }
}

impl From<&str> for Operand {
    fn from(arg: &str) -> Self {
        Operand::parse(arg)
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Declare { var, value } => write!(f, "DECLARE {} {}", var, value),
            Instruction::Add { dst, lhs, rhs } => write!(f, "ADD {} {} {}", dst, lhs, rhs),
            Instruction::Subtract { dst, lhs, rhs } => {
                write!(f, "SUBTRACT {} {} {}", dst, lhs, rhs)
            }
            Instruction::Print { words } => write!(f, "PRINT {}", words.join(" ")),
            Instruction::Sleep { ticks } => write!(f, "SLEEP {}", ticks),
            Instruction::For { repeats, body } => {
                write!(f, "FOR {} [", repeats)?;
                for (i, instruction) in body.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", instruction)?;
                }
                write!(f, "]")
            }
            Instruction::Unknown { op, args } => {
                write!(f, "{}", op)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// What the interpreter tells the core after one instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Keep going.
    Continue,
    /// The process went to sleep and must leave the core now.
    SleepEntered,
    /// There was nothing to execute: the program is over or the process is asleep.
    Blocked,
}

/// Expands every `FOR` into its repeated body, recursively.
pub fn flatten(program: impl IntoIterator<Item = Instruction>) -> Vec<Instruction> {
    let mut flat = Vec::new();
    for instruction in program {
        push_flat(&mut flat, instruction);
    }
    flat
}

fn push_flat(flat: &mut Vec<Instruction>, instruction: Instruction) {
    match instruction {
        Instruction::For { repeats, body } => {
            for _ in 0..repeats {
                for inner in &body {
                    push_flat(flat, inner.clone());
                }
            }
        }
        other => flat.push(other),
    }
}
