use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use tracing::debug;

use crate::diagnostics::DiagnosticService;
use crate::variable::{DataType, Variable};

/// Flat byte-addressable main memory, 4 MiB.
pub const MAIN_MEMORY_SIZE: usize = 4096 * 4096;

/// First address handed out by sbrk. Logically disjoint from the variable
/// region; no collision detection between the two is performed.
pub const HEAP_BASE: i32 = 0x1000_0000;

const SIZEOF_INT: usize = 4;
const SIZEOF_DOUBLE: usize = 8;

/// Register names with fixed roles in the syscall and linkage conventions.
pub mod reg {
    pub const V0: &str = "$v0";
    pub const RA: &str = "$ra";
    pub const HI: &str = "$hi";
    pub const LO: &str = "$lo";
    pub const A0: &str = "$a0";
    pub const A1: &str = "$a1";
    pub const F0: &str = "$f0";
    pub const F12: &str = "$f12";
    pub const CAUSE: &str = "$cause";
    pub const EPC: &str = "$epc";
    /// Scratch register mirrored by load-linked / store-conditional.
    pub const LL_SCRATCH: &str = "$t1";
}

/// The four owned memory regions. Held behind an `Option` on [`Machine`] so
/// release is idempotent.
#[derive(Debug)]
struct Regions {
    int_bank: Vec<u8>,
    fp_bank: Vec<u8>,
    cp0_bank: Vec<u8>,
    memory: Vec<u8>,
}

/// The simulated CPU: three register banks, main memory, heap pointer,
/// label table, program counter and the shutdown signal.
///
/// All register and memory access goes through the accessors here, which
/// validate names and bounds before touching the buffers. Multi-byte values
/// are stored big-endian and converted to host order on every access.
pub struct Machine {
    int_offsets: HashMap<String, usize>,
    fp_offsets: HashMap<String, usize>,
    cp0_offsets: HashMap<String, usize>,
    regions: Option<Regions>,

    labels: HashMap<String, usize>,
    variable_addresses: HashMap<String, i32>,

    pc: i64,
    fp_condition_flag: bool,
    ll_bit: bool,
    heap_pointer: i32,

    shutdown_requested: AtomicBool,
    exit_code: AtomicI32,
    completed: bool,

    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,

    pub diagnostics: DiagnosticService,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &self.pc)
            .field("heap_pointer", &self.heap_pointer)
            .field("ll_bit", &self.ll_bit)
            .field("shutdown_requested", &self.shutdown_requested)
            .finish_non_exhaustive()
    }
}

impl Machine {
    pub fn new(diagnostics: DiagnosticService) -> Self {
        Self::with_io(
            diagnostics,
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Builds a machine with injected I/O streams; syscall reads and prints
    /// go through these instead of the process stdio.
    pub fn with_io(
        diagnostics: DiagnosticService,
        input: Box<dyn BufRead + Send>,
        output: Box<dyn Write + Send>,
    ) -> Self {
        let (int_offsets, int_size) = int_register_layout();
        let (fp_offsets, fp_size) = fp_register_layout();
        let (cp0_offsets, cp0_size) = cp0_register_layout();

        Self {
            int_offsets,
            fp_offsets,
            cp0_offsets,
            regions: Some(Regions {
                int_bank: vec![0; int_size],
                fp_bank: vec![0; fp_size],
                cp0_bank: vec![0; cp0_size],
                memory: vec![0; MAIN_MEMORY_SIZE],
            }),
            labels: HashMap::new(),
            variable_addresses: HashMap::new(),
            pc: 0,
            fp_condition_flag: false,
            ll_bit: false,
            heap_pointer: HEAP_BASE,
            shutdown_requested: AtomicBool::new(false),
            exit_code: AtomicI32::new(0),
            completed: false,
            input,
            output,
            diagnostics,
        }
    }

    // ------------------------------------------------
    // Integer register bank
    // ------------------------------------------------

    pub fn has_int_register(&self, name: &str) -> bool {
        self.int_offsets.contains_key(name)
    }

    /// Byte offset of a register inside the integer bank. Exposed for the
    /// inherited "destination already in use" precondition, which compares
    /// this offset against zero.
    pub fn int_register_offset(&self, name: &str) -> Option<usize> {
        self.int_offsets.get(name).copied()
    }

    pub fn register_value(&mut self, name: &str) -> i32 {
        let Some(&offset) = self.int_offsets.get(name) else {
            self.diagnostics.add_error(format!("Unknown register: {name}"));
            return 0;
        };
        let Some(regions) = self.regions.as_ref() else {
            return 0;
        };
        let b = &regions.int_bank;
        i32::from_be_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
    }

    pub fn set_register_value(&mut self, name: &str, value: i32) {
        let Some(&offset) = self.int_offsets.get(name) else {
            self.diagnostics.add_error(format!("Unknown register: {name}"));
            return;
        };
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(name, value, "set integer register");
        regions.int_bank[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    // ------------------------------------------------
    // Floating-point register bank
    // ------------------------------------------------

    pub fn has_fp_register(&self, name: &str) -> bool {
        self.fp_offsets.contains_key(name)
    }

    pub fn fp_register_offset(&self, name: &str) -> Option<usize> {
        self.fp_offsets.get(name).copied()
    }

    pub fn fp_register_value(&mut self, name: &str) -> f64 {
        let Some(&offset) = self.fp_offsets.get(name) else {
            self.diagnostics
                .add_error(format!("Unknown FP register: {name}"));
            return 0.0;
        };
        let Some(regions) = self.regions.as_ref() else {
            return 0.0;
        };
        let b = &regions.fp_bank;
        f64::from_be_bytes([
            b[offset],
            b[offset + 1],
            b[offset + 2],
            b[offset + 3],
            b[offset + 4],
            b[offset + 5],
            b[offset + 6],
            b[offset + 7],
        ])
    }

    pub fn set_fp_register_value(&mut self, name: &str, value: f64) {
        let Some(&offset) = self.fp_offsets.get(name) else {
            self.diagnostics
                .add_error(format!("Unknown FP register: {name}"));
            return;
        };
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(name, value, "set FP register");
        regions.fp_bank[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
    }

    // ------------------------------------------------
    // CP0 register bank
    // ------------------------------------------------

    pub fn has_cp0_register(&self, name: &str) -> bool {
        self.cp0_offsets.contains_key(name)
    }

    pub fn cp0_register_value(&mut self, name: &str) -> i32 {
        let Some(&offset) = self.cp0_offsets.get(name) else {
            self.diagnostics
                .add_error(format!("Unknown CP0 register: {name}"));
            return 0;
        };
        let Some(regions) = self.regions.as_ref() else {
            return 0;
        };
        let b = &regions.cp0_bank;
        i32::from_be_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
    }

    pub fn set_cp0_register_value(&mut self, name: &str, value: i32) {
        let Some(&offset) = self.cp0_offsets.get(name) else {
            self.diagnostics
                .add_error(format!("Unknown CP0 register: {name}"));
            return;
        };
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(name, value, "set CP0 register");
        regions.cp0_bank[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    // ------------------------------------------------
    // Main memory
    // ------------------------------------------------

    /// Reports out-of-range accesses as diagnostics. The access itself is
    /// suppressed when it cannot be performed against the owned buffer.
    fn check_memory_bounds(&mut self, address: i32, size: usize) -> bool {
        if address < 0 || address as i64 + size as i64 > MAIN_MEMORY_SIZE as i64 {
            self.diagnostics.add_error(format!(
                "Memory access out of bounds: address={address} size={size}"
            ));
            return false;
        }
        true
    }

    pub fn store_byte(&mut self, address: i32, value: u8) {
        if !self.check_memory_bounds(address, 1) {
            return;
        }
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(address, value, "store byte");
        regions.memory[address as usize] = value;
    }

    pub fn load_byte(&mut self, address: i32) -> u8 {
        if !self.check_memory_bounds(address, 1) {
            return 0;
        }
        let Some(regions) = self.regions.as_ref() else {
            return 0;
        };
        regions.memory[address as usize]
    }

    pub fn store_half_word(&mut self, address: i32, value: i16) {
        if !self.check_memory_bounds(address, 2) {
            return;
        }
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(address, value, "store half word");
        let a = address as usize;
        regions.memory[a..a + 2].copy_from_slice(&value.to_be_bytes());
    }

    pub fn load_half_word(&mut self, address: i32) -> i16 {
        if !self.check_memory_bounds(address, 2) {
            return 0;
        }
        let Some(regions) = self.regions.as_ref() else {
            return 0;
        };
        let a = address as usize;
        let m = &regions.memory;
        i16::from_be_bytes([m[a], m[a + 1]])
    }

    pub fn store_word(&mut self, address: i32, value: i32) {
        if !self.check_memory_bounds(address, 4) {
            return;
        }
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(address, value, "store word");
        let a = address as usize;
        regions.memory[a..a + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn load_word(&mut self, address: i32) -> i32 {
        if !self.check_memory_bounds(address, 4) {
            return 0;
        }
        let Some(regions) = self.regions.as_ref() else {
            return 0;
        };
        let a = address as usize;
        let m = &regions.memory;
        i32::from_be_bytes([m[a], m[a + 1], m[a + 2], m[a + 3]])
    }

    pub fn store_float(&mut self, address: i32, value: f32) {
        if !self.check_memory_bounds(address, 4) {
            return;
        }
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(address, value, "store float");
        let a = address as usize;
        regions.memory[a..a + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn load_float(&mut self, address: i32) -> f32 {
        if !self.check_memory_bounds(address, 4) {
            return 0.0;
        }
        let Some(regions) = self.regions.as_ref() else {
            return 0.0;
        };
        let a = address as usize;
        let m = &regions.memory;
        f32::from_be_bytes([m[a], m[a + 1], m[a + 2], m[a + 3]])
    }

    /// Stores the raw bit pattern of a doubleword (eight bytes).
    pub fn store_double_word(&mut self, address: i32, bits: u64) {
        if !self.check_memory_bounds(address, 8) {
            return;
        }
        let Some(regions) = self.regions.as_mut() else {
            return;
        };
        debug!(address, bits, "store double word");
        let a = address as usize;
        regions.memory[a..a + 8].copy_from_slice(&bits.to_be_bytes());
    }

    pub fn load_double_word(&mut self, address: i32) -> u64 {
        if !self.check_memory_bounds(address, 8) {
            return 0;
        }
        let Some(regions) = self.regions.as_ref() else {
            return 0;
        };
        let a = address as usize;
        let m = &regions.memory;
        u64::from_be_bytes([
            m[a],
            m[a + 1],
            m[a + 2],
            m[a + 3],
            m[a + 4],
            m[a + 5],
            m[a + 6],
            m[a + 7],
        ])
    }

    /// SWL: merges the high-order bytes of `value` into the aligned word
    /// containing `address`, keyed on `address % 4`.
    pub fn store_word_left(&mut self, address: i32, value: i32) {
        let aligned = address & !3;
        if !self.check_memory_bounds(aligned, 4) {
            return;
        }
        let shift = (address & 3) * 8;
        let mask = (u32::MAX >> shift) as i32;
        let existing = self.load_word(aligned);
        let merged = (value.wrapping_shl(shift as u32)) | (existing & mask);
        self.store_word(aligned, merged);
    }

    /// SWR: merges the low-order bytes of `value` into the aligned word.
    pub fn store_word_right(&mut self, address: i32, value: i32) {
        let aligned = address & !3;
        if !self.check_memory_bounds(aligned, 4) {
            return;
        }
        let shift = (3 - (address & 3)) * 8;
        let mask = (-1i32).wrapping_shl(shift as u32);
        let existing = self.load_word(aligned);
        let merged = ((value as u32 >> shift) as i32) | (existing & mask);
        self.store_word(aligned, merged);
    }

    /// LWL: high-order bytes of the aligned word, shifted down by
    /// `address % 4`.
    pub fn load_word_left(&mut self, address: i32) -> i32 {
        let aligned = address & !3;
        if !self.check_memory_bounds(aligned, 4) {
            return 0;
        }
        let shift = (address & 3) * 8;
        let value = self.load_word(aligned);
        ((value as u32) >> shift) as i32
    }

    /// LWR: low-order bytes of the aligned word, shifted up.
    pub fn load_word_right(&mut self, address: i32) -> i32 {
        let aligned = address & !3;
        if !self.check_memory_bounds(aligned, 4) {
            return 0;
        }
        let shift = (3 - (address & 3)) * 8;
        let value = self.load_word(aligned);
        value.wrapping_shl(shift as u32)
    }

    // ------------------------------------------------
    // Load-linked / store-conditional
    // ------------------------------------------------

    /// Sets the LL bit and mirrors the loaded word into the scratch register.
    pub fn load_linked(&mut self, address: i32) {
        self.ll_bit = true;
        let value = self.load_word(address);
        self.set_register_value(reg::LL_SCRATCH, value);
        debug!("LL bit set");
    }

    /// Commits only if the LL bit is still set; the scratch register reads
    /// 1 on success and 0 on failure.
    pub fn store_conditional(&mut self, address: i32, value: i32) {
        if self.ll_bit {
            self.store_word(address, value);
            self.ll_bit = false;
            self.set_register_value(reg::LL_SCRATCH, 1);
        } else {
            self.set_register_value(reg::LL_SCRATCH, 0);
        }
    }

    // ------------------------------------------------
    // Variable layout
    // ------------------------------------------------

    /// Lays out the `.data` variables sequentially from address 0 in
    /// declaration order. Runs once at program start.
    pub fn initialize_variables(&mut self, variables: &[Variable]) {
        let mut address: i32 = 0;

        for var in variables {
            self.variable_addresses.insert(var.name.clone(), address);

            match var.ty {
                DataType::Word => {
                    match var.value.parse::<i32>() {
                        Ok(v) => self.store_word(address, v),
                        Err(_) => self
                            .diagnostics
                            .add_error(format!("Invalid value for .word: {}", var.value)),
                    }
                    address += SIZEOF_INT as i32;
                }
                DataType::Byte => {
                    match var.value.parse::<i8>() {
                        Ok(v) => self.store_byte(address, v as u8),
                        Err(_) => self
                            .diagnostics
                            .add_error(format!("Invalid value for .byte: {}", var.value)),
                    }
                    address += 1;
                }
                DataType::Half => {
                    match var.value.parse::<i16>() {
                        Ok(v) => self.store_half_word(address, v),
                        Err(_) => self
                            .diagnostics
                            .add_error(format!("Invalid value for .half: {}", var.value)),
                    }
                    address += 2;
                }
                DataType::Float => {
                    match var.value.parse::<f32>() {
                        Ok(v) => self.store_float(address, v),
                        Err(_) => self
                            .diagnostics
                            .add_error(format!("Invalid value for .float: {}", var.value)),
                    }
                    address += 4;
                }
                DataType::Double => {
                    match var.value.parse::<f64>() {
                        Ok(v) => self.store_double_word(address, v.to_bits()),
                        Err(_) => self
                            .diagnostics
                            .add_error(format!("Invalid value for .double: {}", var.value)),
                    }
                    address += SIZEOF_DOUBLE as i32;
                }
                DataType::Ascii | DataType::Asciiz => {
                    let text = var.value.replace('"', "");
                    for b in text.bytes() {
                        self.store_byte(address, b);
                        address += 1;
                    }
                    if var.is(DataType::Asciiz) {
                        self.store_byte(address, 0);
                        address += 1;
                    }
                }
                DataType::Space => match var.value.parse::<i32>() {
                    Ok(size) => {
                        for _ in 0..size {
                            self.store_byte(address, 0);
                            address += 1;
                        }
                    }
                    Err(_) => self
                        .diagnostics
                        .add_error(format!("Invalid value for .space: {}", var.value)),
                },
            }

            debug!(
                name = %var.name,
                directive = var.ty.directive(),
                end = address,
                "initialized variable"
            );
        }
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable_addresses.contains_key(name)
    }

    pub fn variable_address(&mut self, name: &str) -> Option<i32> {
        let address = self.variable_addresses.get(name).copied();
        if address.is_none() {
            self.diagnostics
                .add_error(format!("Variable not found: {name}"));
        }
        address
    }

    pub fn load_address(&mut self, target_register: &str, address: i32) {
        debug!(address, target_register, "loading address");
        self.set_register_value(target_register, address);
    }

    // ------------------------------------------------
    // Heap
    // ------------------------------------------------

    /// Bump allocation for sbrk. The pointer is re-aligned to a word after
    /// each bump; nothing is ever reclaimed.
    pub fn allocate(&mut self, bytes: i32) -> i32 {
        let current = self.heap_pointer;
        self.heap_pointer = self.heap_pointer.wrapping_add(bytes);
        if self.heap_pointer % 4 != 0 {
            self.heap_pointer += 4 - self.heap_pointer % 4;
        }
        debug!(bytes, address = current, "heap allocation");
        current
    }

    // ------------------------------------------------
    // Control transfer
    // ------------------------------------------------

    pub fn define_label(&mut self, name: &str, index: usize) {
        self.labels.insert(name.to_string(), index);
        debug!(name, index, "label resolved");
    }

    pub fn label_target(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Branch semantics: `pc = target - 1` so the loop's own increment lands
    /// exactly on the target slot.
    pub fn branch_to_label(&mut self, label: &str) {
        match self.labels.get(label) {
            Some(&target) => {
                self.pc = target as i64 - 1;
                debug!(label, target, "branching to label");
            }
            None => self
                .diagnostics
                .add_error(format!("Label not found: {label}")),
        }
    }

    /// Jump semantics: `pc = target` directly. Combined with the loop
    /// increment this lands one slot past the target; in practice the target
    /// slot is the label marker, so the first real instruction still runs.
    pub fn jump_to_label(&mut self, label: &str) {
        match self.labels.get(label) {
            Some(&target) => {
                self.pc = target as i64;
                debug!(label, target, "jumping to label");
            }
            None => self
                .diagnostics
                .add_error(format!("Label not found: {label}")),
        }
    }

    pub fn jump_to_register(&mut self, register: &str) {
        let target = self.register_value(register);
        self.pc = target as i64;
        debug!(register, target, "jumping to register");
    }

    pub fn program_counter(&self) -> i64 {
        self.pc
    }

    pub fn set_program_counter(&mut self, pc: i64) {
        self.pc = pc;
    }

    pub fn advance(&mut self) {
        self.pc += 1;
    }

    pub fn fp_condition_flag(&self) -> bool {
        self.fp_condition_flag
    }

    pub fn set_fp_condition_flag(&mut self, flag: bool) {
        self.fp_condition_flag = flag;
    }

    // ------------------------------------------------
    // Shutdown
    // ------------------------------------------------

    /// Level-triggered shutdown request; the first caller's exit code wins
    /// and later requests are no-ops.
    pub fn request_shutdown(&self, exit_code: i32) {
        if self
            .shutdown_requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.exit_code.store(exit_code, Ordering::SeqCst);
            debug!(exit_code, "shutdown requested");
        }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }

    /// Releases the memory regions and marks completion. Safe to call more
    /// than once; the second call is a no-op. Returns the exit code.
    pub fn finish(&mut self) -> i32 {
        if self.regions.take().is_some() {
            debug!("memory regions released");
        }
        if !self.completed {
            self.completed = true;
            debug!(exit_code = self.exit_code(), "shutdown complete");
        }
        self.exit_code()
    }

    pub fn is_finished(&self) -> bool {
        self.completed
    }

    // ------------------------------------------------
    // Syscall I/O
    // ------------------------------------------------

    /// Emits one line of program output through the sink.
    pub fn print_line(&mut self, text: &str) {
        if writeln!(self.output, "{text}").is_err() {
            self.diagnostics.add_error("I/O error while writing output.");
            return;
        }
        let _ = self.output.flush();
    }

    /// Reads one line of input; `Ok(None)` signals end of input.
    pub fn read_input_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Reads a single byte of input; `Ok(None)` signals end of input.
    pub fn read_input_char(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.input.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

/// `$a0..$a7`, then `$t0..$t31` interleaved with `$v0..$v31`, then the
/// linkage and multiply registers. The bank is sized from the layout cursor
/// so every named register is in bounds.
fn int_register_layout() -> (HashMap<String, usize>, usize) {
    let mut offsets = HashMap::new();
    let mut cursor = 0;

    for i in 0..8 {
        offsets.insert(format!("$a{i}"), cursor);
        cursor += SIZEOF_INT;
    }
    for i in 0..32 {
        offsets.insert(format!("$t{i}"), cursor);
        cursor += SIZEOF_INT;
        offsets.insert(format!("$v{i}"), cursor);
        cursor += SIZEOF_INT;
    }
    for name in ["$ra", "$hi", "$lo"] {
        offsets.insert(name.to_string(), cursor);
        cursor += SIZEOF_INT;
    }

    (offsets, cursor)
}

fn fp_register_layout() -> (HashMap<String, usize>, usize) {
    let mut offsets = HashMap::new();
    let mut cursor = 0;

    for i in 0..32 {
        offsets.insert(format!("$f{i}"), cursor);
        cursor += SIZEOF_DOUBLE;
    }

    (offsets, cursor)
}

/// `cp0_0..cp0_31`, with the conventional `$cause`/`$epc` aliases pointing
/// at CP0 registers 13 and 14.
fn cp0_register_layout() -> (HashMap<String, usize>, usize) {
    let mut offsets = HashMap::new();
    let mut cursor = 0;

    for i in 0..32 {
        offsets.insert(format!("cp0_{i}"), cursor);
        cursor += SIZEOF_INT;
    }
    offsets.insert(reg::CAUSE.to_string(), 13 * SIZEOF_INT);
    offsets.insert(reg::EPC.to_string(), 14 * SIZEOF_INT);

    (offsets, cursor)
}
