//! Writer that builds [`DsonValue`] trees instead of bytes.
//!
//! Each open container is assembled in its frame and attached to the parent
//! when it closes; completed top-level values are collected in order.

use crate::context::{Context, ContextType, Cursor};
use crate::key::FieldKey;
use crate::options::DsonOptions;
use crate::types::{DsonType, FieldNumber};
use crate::value::{DsonArray, DsonHeader, DsonObject, DsonValue};
use crate::wire;
use crate::writer::{Scalar, WriteSink, Writer};
use crate::{Error, Result};
use std::mem;
use std::sync::Arc;

/// Tree writer with string field names.
pub type DsonTreeWriter = Writer<String, TreeSink<String>>;
/// Tree writer with field numbers.
pub type DsonLiteTreeWriter = Writer<FieldNumber, TreeSink<FieldNumber>>;

/// In-memory backend of the tree writer.
#[derive(Debug)]
pub struct TreeSink<K> {
    values: Vec<DsonValue<K>>,
    options: DsonOptions,
}

impl<K> TreeSink<K> {
    /// `options` bound the decoder used for bytes written with
    /// `write_value_bytes`.
    #[must_use]
    pub fn new(options: DsonOptions) -> Self {
        TreeSink {
            values: Vec::new(),
            options,
        }
    }
}

impl<K> crate::sealed::Sealed for TreeSink<K> {}

impl<K: FieldKey> TreeSink<K> {
    fn place(&mut self, ctx: &mut Context<K>, name: Option<K>, value: DsonValue<K>) -> Result<()> {
        if ctx.context_type == ContextType::TopLevel {
            self.values.push(value);
            return Ok(());
        }
        match &mut ctx.cursor {
            Cursor::Building { value: node, .. } => attach_child(node, name, value),
            _ => Err(Error::custom("frame has no container under construction")),
        }
    }
}

fn attach_child<K: FieldKey>(node: &mut DsonValue<K>, name: Option<K>, value: DsonValue<K>) -> Result<()> {
    match node {
        DsonValue::Object(object) => match (value, name) {
            (DsonValue::Header(header), _) => {
                object.header = header;
                Ok(())
            }
            (value, Some(name)) => {
                object.insert(name, value);
                Ok(())
            }
            (_, None) => Err(Error::custom("object field without a name")),
        },
        DsonValue::Array(array) => {
            match value {
                DsonValue::Header(header) => array.header = header,
                value => array.push(value),
            }
            Ok(())
        }
        DsonValue::Header(header) => match name {
            Some(name) => header.insert(name, value).map(drop),
            None => Err(Error::custom("header field without a name")),
        },
        other => Err(Error::custom(format!(
            "{} cannot hold child values",
            other.dson_type()
        ))),
    }
}

impl<K: FieldKey> WriteSink<K> for TreeSink<K> {
    fn write_scalar(&mut self, ctx: &mut Context<K>, name: Option<&K::Ref>, value: Scalar<'_>) -> Result<()> {
        self.place(ctx, name.map(|n| n.to_owned()), value.to_value())
    }

    fn start_container(
        &mut self,
        _parent: &mut Context<K>,
        child: &mut Context<K>,
        name: Option<&K::Ref>,
    ) -> Result<()> {
        let value = match child.context_type {
            ContextType::Header => DsonValue::Header(DsonHeader::new()),
            ContextType::Array => DsonValue::Array(DsonArray::new()),
            _ => DsonValue::Object(DsonObject::new()),
        };
        child.cursor = Cursor::Building {
            value,
            name: name.map(|n| n.to_owned()),
        };
        Ok(())
    }

    fn end_container(&mut self, parent: &mut Context<K>, child: &mut Context<K>) -> Result<()> {
        match mem::take(&mut child.cursor) {
            Cursor::Building { value, name } => self.place(parent, name, value),
            _ => Err(Error::custom("container was not started by this writer")),
        }
    }

    fn write_value_bytes(
        &mut self,
        ctx: &mut Context<K>,
        name: Option<&K::Ref>,
        dson_type: DsonType,
        bytes: &[u8],
    ) -> Result<()> {
        let mut encoded = Vec::with_capacity(bytes.len() + 1);
        encoded.push(wire::make_tag(dson_type, 0));
        encoded.extend_from_slice(bytes);
        let mut values = crate::from_slice_with_options::<K>(&encoded, self.options.clone())?;
        let value = match (values.pop(), values.is_empty()) {
            (Some(value), true) => value,
            _ => {
                return Err(Error::invalid_format(
                    0,
                    "encoded bytes do not hold exactly one container",
                ))
            }
        };
        self.place(ctx, name.map(|n| n.to_owned()), value)
    }

    fn top_level_done(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn position(&self) -> usize {
        0
    }

    fn close(&mut self, _auto_close: bool) -> Result<()> {
        Ok(())
    }
}

impl<K: FieldKey> Writer<K, TreeSink<K>> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DsonOptions::default())
    }

    #[must_use]
    pub fn with_options(options: DsonOptions) -> Self {
        let sink = TreeSink::new(options.clone());
        Writer::with_sink(sink, options, Arc::clone(K::shared_pool()))
    }

    /// Top-level values completed so far.
    #[must_use]
    pub fn values(&self) -> &[DsonValue<K>] {
        &self.sink.values
    }

    /// Takes the completed top-level values.
    #[must_use]
    pub fn into_values(mut self) -> Vec<DsonValue<K>> {
        mem::take(&mut self.sink.values)
    }
}

impl<K: FieldKey> Default for Writer<K, TreeSink<K>> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::DsonWriter;
    use crate::WireType;

    #[test]
    fn test_builds_nested_tree() {
        let mut writer = DsonTreeWriter::new();
        writer.write_start_object(None).unwrap();
        writer.write_start_header().unwrap();
        writer.write_string(Some("clsName"), "Point").unwrap();
        writer.write_end_header().unwrap();
        writer.write_int32(Some("x"), 1, WireType::Sint).unwrap();
        writer.write_name("tags").unwrap();
        writer.write_start_array(None).unwrap();
        writer.write_string(None, "a").unwrap();
        writer.write_null(None).unwrap();
        writer.write_end_array().unwrap();
        writer.write_end_object().unwrap();

        let values = writer.into_values();
        assert_eq!(values.len(), 1);
        let object = values[0].as_object().unwrap();
        assert_eq!(
            object.header.get("clsName").and_then(DsonValue::as_str),
            Some("Point")
        );
        assert_eq!(object.get("x"), Some(&DsonValue::Int32(1)));
        assert_eq!(object.get("tags").and_then(DsonValue::as_array).map(DsonArray::len), Some(2));
    }

    #[test]
    fn test_value_bytes_decoded_in_place() {
        let mut writer = DsonTreeWriter::new();
        writer.write_start_object(None).unwrap();
        writer
            .write_value_bytes(Some("inner"), DsonType::Array, &[0x01, 0, 0, 0, 0x29])
            .unwrap();
        writer.write_end_object().unwrap();
        let inner = writer.values()[0].as_object().unwrap().get("inner").cloned();
        assert_eq!(
            inner,
            Some(DsonValue::Array(DsonArray::with_values(vec![DsonValue::Bool(true)])))
        );
    }

    #[test]
    fn test_lite_field_numbers() {
        let field = FieldNumber::new(3, 0).unwrap();
        let mut writer = DsonLiteTreeWriter::new();
        writer.write_start_object(None).unwrap();
        writer.write_bool(Some(&field), false).unwrap();
        writer.write_end_object().unwrap();
        let values = writer.into_values();
        assert_eq!(values[0].as_object().unwrap().get(&field), Some(&DsonValue::Bool(false)));
    }

    #[test]
    fn test_value_bytes_use_writer_recursion_limit() {
        let mut value: DsonValue = DsonValue::Array(DsonArray::new());
        for _ in 0..99 {
            value = DsonValue::Array(DsonArray::with_values(vec![value]));
        }
        let options = DsonOptions::new().with_recursion_limit(200);
        let encoded = crate::to_vec_with_options(&[value.clone()], options.clone()).unwrap();

        let mut writer = DsonTreeWriter::with_options(options);
        writer
            .write_value_bytes(None, DsonType::Array, &encoded[1..])
            .unwrap();
        assert_eq!(writer.into_values(), vec![value]);

        let mut shallow = DsonTreeWriter::new();
        assert!(matches!(
            shallow.write_value_bytes(None, DsonType::Array, &encoded[1..]),
            Err(Error::RecursionLimit { limit: 64 })
        ));
    }
}
