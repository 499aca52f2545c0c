//! Synthetic workload generation.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::instruction::{Instruction, Operand};

const VARIABLES: [&str; 4] = ["var1", "var2", "var3", "var4"];

/// Longest program the generator builds, whatever bounds it is given.
///
/// Configurations may ask for up to 2^32 instructions; programs are held in
/// memory, so lengths are clamped to this.
pub const MAX_PROGRAM_LEN: usize = 1 << 16;

/// Builds random, well-formed programs whose length lies in a fixed range.
#[derive(Debug)]
pub struct Generator {
    lengths: RangeInclusive<usize>,
    rng: StdRng,
}

impl Generator {
    /// A generator seeded from the operating system.
    ///
    /// Bounds are clamped to `1..=MAX_PROGRAM_LEN`.
    pub fn new(min_instructions: usize, max_instructions: usize) -> Generator {
        Generator::with_rng(min_instructions, max_instructions, StdRng::from_entropy())
    }

    /// A reproducible generator.
    pub fn seeded(min_instructions: usize, max_instructions: usize, seed: u64) -> Generator {
        Generator::with_rng(min_instructions, max_instructions, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min_instructions: usize, max_instructions: usize, rng: StdRng) -> Generator {
        let min = min_instructions.clamp(1, MAX_PROGRAM_LEN);
        let max = max_instructions.clamp(min, MAX_PROGRAM_LEN);
        Generator {
            lengths: min..=max,
            rng,
        }
    }

    /// Generates a flat program for the process called `name`.
    ///
    /// The program declares `var1`..`var4` first, then picks uniformly
    /// among the six instruction kinds. A `FOR` is emitted already
    /// expanded into 2 to 4 increments of one variable, truncated so the
    /// program never exceeds its drawn length.
    pub fn program(&mut self, name: &str) -> Vec<Instruction> {
        let length = self.rng.gen_range(self.lengths.clone());
        let mut program = Vec::with_capacity(length);

        for var in VARIABLES.iter().take(length) {
            let value: u16 = self.rng.gen_range(0..=100);
            program.push(Instruction::declare(*var, value));
        }

        while program.len() < length {
            match self.rng.gen_range(0..6) {
                0 => {
                    let var = self.variable();
                    let value: u16 = self.rng.gen_range(0..=100);
                    program.push(Instruction::declare(var, value));
                }
                1 => {
                    let (dst, lhs, rhs) = (self.variable(), self.variable(), self.operand());
                    program.push(Instruction::add(dst, Operand::var(lhs), rhs));
                }
                2 => {
                    let (dst, lhs, rhs) = (self.variable(), self.variable(), self.operand());
                    program.push(Instruction::subtract(dst, Operand::var(lhs), rhs));
                }
                3 => {
                    let text = if self.rng.gen_bool(0.5) {
                        format!("Hello world from {}!", name)
                    } else {
                        format!("Value from: {}", self.variable())
                    };
                    program.push(Instruction::print(&text));
                }
                4 => {
                    let ticks: u16 = self.rng.gen_range(1..=3);
                    program.push(Instruction::sleep(ticks));
                }
                _ => {
                    let var = self.variable();
                    let repeats = self.rng.gen_range(2..=4).min(length - program.len());
                    for _ in 0..repeats {
                        program.push(Instruction::add(var, Operand::var(var), 1));
                    }
                }
            }
        }

        program
    }

    fn variable(&mut self) -> &'static str {
        VARIABLES[self.rng.gen_range(0..VARIABLES.len())]
    }

    fn operand(&mut self) -> Operand {
        if self.rng.gen_bool(0.5) {
            Operand::var(self.variable())
        } else {
            Operand::Literal(self.rng.gen_range(1..=50))
        }
    }
}
