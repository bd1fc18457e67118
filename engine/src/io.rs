//! Reading and writing flat arrays of plain values from and to disk.
//!
//! Graphs are exchanged in the RoutingKit format: one file per array, containing nothing but
//! the raw little endian values. Import `Load` and `Store` and use `load_from` and `write_to`.
//!
//! # Example
//!
//! ```no_run
//! # use edge_ch_witness::io::*;
//!
//! let head = Vec::<u32>::load_from("head")?;
//! head.write_to(&"head_copy")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    ffi::OsStr,
    fs::{metadata, File},
    io::{prelude::*, Result},
    mem,
    path::Path,
    slice,
};

/// Access to the raw bytes of an object.
/// Only implemented for slices of `Copy` types which have no padding, which is the case for the primitives stored here.
pub trait DataBytes {
    fn data_bytes(&self) -> &[u8];
}

/// Mutable access to the raw bytes of a precreated object of the right size.
pub trait DataBytesMut {
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Copy> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = mem::size_of_val(self);
        unsafe { slice::from_raw_parts(self.as_ptr() as *const u8, num_bytes) }
    }
}

impl<T: Copy> DataBytes for Vec<T> {
    fn data_bytes(&self) -> &[u8] {
        self[..].data_bytes()
    }
}

impl<T: Copy> DataBytesMut for Vec<T> {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        let num_bytes = mem::size_of_val(&self[..]);
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr() as *mut u8, num_bytes) }
    }
}

pub trait Store: DataBytes {
    /// Write the raw bytes into the file at `path`, replacing whatever was there.
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: DataBytes + ?Sized> Store for T {}

pub trait Load: DataBytesMut + Sized {
    /// Create an object large enough to hold `num_bytes` bytes.
    fn new_with_bytes(num_bytes: usize) -> Self;

    /// Read the whole file at `path` into a new object.
    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let metadata = metadata(path.as_ref())?;
        let mut file = File::open(path)?;

        let mut object = Self::new_with_bytes(metadata.len() as usize);
        assert_eq!(metadata.len() as usize, object.data_bytes_mut().len());
        file.read_exact(object.data_bytes_mut())?;

        Ok(object)
    }
}

impl<T: Default + Copy> Load for Vec<T> {
    fn new_with_bytes(num_bytes: usize) -> Self {
        assert_eq!(num_bytes % mem::size_of::<T>(), 0, "file size is not a multiple of the element size");
        vec![T::default(); num_bytes / mem::size_of::<T>()]
    }
}

/// Loads files relative to a directory.
#[derive(Debug)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    pub fn load<T: Load, P: AsRef<Path>>(&self, file: P) -> Result<T> {
        T::load_from(self.path.join(file))
    }

    /// Like `load` but an empty object for files which do not exist.
    pub fn load_optional<T: Load + Default, P: AsRef<Path>>(&self, file: P) -> Result<T> {
        let path = self.path.join(file);
        if path.exists() {
            T::load_from(path)
        } else {
            Ok(T::default())
        }
    }
}

/// Objects which are stored as several files in one directory.
pub trait Reconstruct: Sized {
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    fn reconstruct_from<D: AsRef<OsStr> + ?Sized>(dir: &D) -> Result<Self> {
        Self::reconstruct_with(Loader { path: Path::new(dir) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_arrays_load_back() {
        let dir = std::env::temp_dir().join(format!("edge_ch_witness_io_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let values: Vec<u32> = vec![0, 7, 42, u32::MAX];
        values.write_to(&dir.join("values")).unwrap();
        assert_eq!(Vec::<u32>::load_from(dir.join("values")).unwrap(), values);

        let loader = Loader { path: &dir };
        assert_eq!(loader.load_optional::<Vec<u32>, _>("missing").unwrap(), Vec::<u32>::new());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
