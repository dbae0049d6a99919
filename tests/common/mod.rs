//! Shared builders for integration tests.

#![allow(dead_code)]

pub const IMAGE_FILE_MACHINE_I386: u16 = 0x014c;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

/// Builder for a minimal PE image: DOS header, signature, COFF header and
/// an optional header, followed by optional trailing bytes.
#[derive(Debug, Clone)]
pub struct PeBuilder {
    pub pe_offset: u32,
    pub machine: u16,
    pub magic: u16,
    pub optional_header_size: u16,
    pub entry_point: u32,
    pub trailer: Vec<u8>,
}

impl PeBuilder {
    pub fn pe32(entry_point: u32) -> Self {
        Self {
            pe_offset: 0x80,
            machine: IMAGE_FILE_MACHINE_I386,
            magic: 0x010B,
            optional_header_size: 0xE0,
            entry_point,
            trailer: Vec::new(),
        }
    }

    pub fn pe32plus(entry_point: u32) -> Self {
        Self {
            pe_offset: 0x80,
            machine: IMAGE_FILE_MACHINE_AMD64,
            magic: 0x020B,
            optional_header_size: 0xF0,
            entry_point,
            trailer: Vec::new(),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let pe = self.pe_offset as usize;
        let opt = pe + 24;
        let mut data = vec![0u8; opt + self.optional_header_size as usize];
        data[0..2].copy_from_slice(b"MZ");
        data[60..64].copy_from_slice(&self.pe_offset.to_le_bytes());
        data[pe..pe + 4].copy_from_slice(b"PE\0\0");
        data[pe + 4..pe + 6].copy_from_slice(&self.machine.to_le_bytes());
        data[pe + 6..pe + 8].copy_from_slice(&1u16.to_le_bytes());
        data[pe + 20..pe + 22].copy_from_slice(&self.optional_header_size.to_le_bytes());
        if self.optional_header_size >= 2 {
            data[opt..opt + 2].copy_from_slice(&self.magic.to_le_bytes());
        }
        if self.optional_header_size >= 20 {
            data[opt + 16..opt + 20].copy_from_slice(&self.entry_point.to_le_bytes());
        }
        data.extend_from_slice(&self.trailer);
        data
    }
}

/// A short x86-64 function touching globals through RIP-relative operands.
///
/// ```text
/// 0x00  push rbp
/// 0x01  mov rbp, rsp
/// 0x04  mov rax, [rip+0x10]
/// 0x0b  lea rcx, [rip+0x200]
/// 0x12  add [rip-0x8], eax
/// 0x18  call [rip+0x1000]
/// 0x1e  pop rbp
/// 0x1f  jmp [rip+0x2000]
/// ```
pub fn sample_function() -> Vec<u8> {
    vec![
        0x55, // push rbp
        0x48, 0x89, 0xE5, // mov rbp, rsp
        0x48, 0x8B, 0x05, 0x10, 0x00, 0x00, 0x00, // mov rax, [rip+0x10]
        0x48, 0x8D, 0x0D, 0x00, 0x02, 0x00, 0x00, // lea rcx, [rip+0x200]
        0x01, 0x05, 0xF8, 0xFF, 0xFF, 0xFF, // add [rip-0x8], eax
        0xFF, 0x15, 0x00, 0x10, 0x00, 0x00, // call [rip+0x1000]
        0x5D, // pop rbp
        0xFF, 0x25, 0x00, 0x20, 0x00, 0x00, // jmp [rip+0x2000]
    ]
}
