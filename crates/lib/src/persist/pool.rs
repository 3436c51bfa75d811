//! Object and string pools for the persisted graph.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bincode::Options;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::types::{ObjectId, PersistError, Persistent, Result};

fn encoding() -> impl Options {
  bincode::DefaultOptions::new()
}

/// Writes a graph, assigning ids to shared objects and interned strings.
#[derive(Debug, Default)]
pub struct PoolWriter {
  buffer: Vec<u8>,
  /// `Arc` allocation address -> object id.
  object_ids: HashMap<usize, ObjectId>,
  /// Every stored object, kept alive so its address cannot be reused by a
  /// later allocation while the writer exists.
  stored: Vec<Arc<dyn Any + Send + Sync>>,
  string_ids: HashMap<String, ObjectId>,
}

impl PoolWriter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Consume the writer and return the encoded stream.
  pub fn into_bytes(self) -> Vec<u8> {
    self.buffer
  }

  /// Write a plain record with no identity tracking.
  pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
    encoding().serialize_into(&mut self.buffer, value)?;
    Ok(())
  }

  /// Write a dynamic property map as length-prefixed JSON text.
  pub fn write_json(&mut self, map: &Map<String, Value>) -> Result<()> {
    let text = serde_json::to_string(map)?;
    self.write(&text)
  }

  /// Write a shared object.
  ///
  /// The first time an allocation is seen it gets the next id and its fields
  /// follow; afterwards only the id is written.
  pub fn store<T: Persistent>(&mut self, object: &Arc<T>) -> Result<()> {
    let address = Arc::as_ptr(object) as *const () as usize;
    if let Some(&id) = self.object_ids.get(&address) {
      return self.write(&id);
    }

    let id = self.object_ids.len() as ObjectId;
    self.object_ids.insert(address, id);
    self.stored.push(object.clone());
    self.write(&id)?;
    object.store(self)
  }

  /// Write a count followed by one pool record per element.
  pub fn store_all<T: Persistent>(&mut self, objects: &[Arc<T>]) -> Result<()> {
    self.write(&(objects.len() as u32))?;
    for object in objects {
      self.store(object)?;
    }
    Ok(())
  }

  /// Write an interned string.
  pub fn store_string(&mut self, value: &str) -> Result<()> {
    if let Some(&id) = self.string_ids.get(value) {
      return self.write(&id);
    }

    let id = self.string_ids.len() as ObjectId;
    self.string_ids.insert(value.to_string(), id);
    self.write(&id)?;
    self.write(value)
  }

  pub fn store_string_list(&mut self, values: &[String]) -> Result<()> {
    self.write(&(values.len() as u32))?;
    for value in values {
      self.store_string(value)?;
    }
    Ok(())
  }

  pub fn store_string_set(&mut self, values: &BTreeSet<String>) -> Result<()> {
    self.write(&(values.len() as u32))?;
    for value in values {
      self.store_string(value)?;
    }
    Ok(())
  }
}

enum Slot {
  /// Id reserved, fields still being read.
  Loading,
  Ready(Arc<dyn Any + Send + Sync>),
}

/// Reads a graph written by [`PoolWriter`].
pub struct PoolReader<'a> {
  input: &'a [u8],
  objects: Vec<Slot>,
  strings: Vec<String>,
}

impl<'a> PoolReader<'a> {
  pub fn new(input: &'a [u8]) -> Self {
    Self {
      input,
      objects: Vec::new(),
      strings: Vec::new(),
    }
  }

  /// Bytes not consumed yet.
  pub fn remaining(&self) -> usize {
    self.input.len()
  }

  /// Read a plain record.
  pub fn read<T: DeserializeOwned>(&mut self) -> Result<T> {
    // Lengths larger than what is left in the stream are rejected before
    // anything gets allocated for them.
    let limit = self.input.len() as u64;
    Ok(encoding().with_limit(limit).deserialize_from(&mut self.input)?)
  }

  pub fn read_json(&mut self) -> Result<Map<String, Value>> {
    let text: String = self.read()?;
    Ok(serde_json::from_str(&text)?)
  }

  /// Read a shared object.
  ///
  /// A new id is reserved before the object's fields are read so nested
  /// records get the ids the writer gave them; a repeated id returns the
  /// instance that was registered for it.
  pub fn load<T: Persistent>(&mut self) -> Result<Arc<T>> {
    let id: ObjectId = self.read()?;
    let index = id as usize;
    match self.objects.get(index) {
      Some(Slot::Ready(object)) => {
        return Arc::clone(object)
          .downcast::<T>()
          .map_err(|_| PersistError::TypeMismatch {
            id,
            expected: std::any::type_name::<T>(),
          });
      }
      Some(Slot::Loading) => return Err(PersistError::Recursive(id)),
      None if index == self.objects.len() => {}
      None => return Err(PersistError::UnknownObject(id)),
    }

    self.objects.push(Slot::Loading);
    let object = Arc::new(T::load(self)?);
    T::on_loaded(&object);

    let shared: Arc<dyn Any + Send + Sync> = object.clone();
    self.objects[index] = Slot::Ready(shared);
    Ok(object)
  }

  pub fn load_all<T: Persistent>(&mut self) -> Result<Vec<Arc<T>>> {
    let count: u32 = self.read()?;
    let mut objects = Vec::new();
    for _ in 0..count {
      objects.push(self.load()?);
    }
    Ok(objects)
  }

  pub fn load_string(&mut self) -> Result<String> {
    let id: ObjectId = self.read()?;
    let index = id as usize;
    if let Some(value) = self.strings.get(index) {
      return Ok(value.clone());
    }
    if index != self.strings.len() {
      return Err(PersistError::UnknownString(id));
    }

    let value: String = self.read()?;
    self.strings.push(value.clone());
    Ok(value)
  }

  pub fn load_string_list(&mut self) -> Result<Vec<String>> {
    let count: u32 = self.read()?;
    let mut values = Vec::new();
    for _ in 0..count {
      values.push(self.load_string()?);
    }
    Ok(values)
  }

  pub fn load_string_set(&mut self) -> Result<BTreeSet<String>> {
    let count: u32 = self.read()?;
    let mut values = BTreeSet::new();
    for _ in 0..count {
      values.insert(self.load_string()?);
    }
    Ok(values)
  }
}
