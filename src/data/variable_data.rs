//! Typed variable reads and CF decoding.

use ndarray::{ArrayD, IxDyn};
use netcdf::types::{FloatType, IntType, NcVariableType};

use crate::error::{CoronaError, Result};

/// Short name of a NetCDF storage type.
pub(super) fn dtype_name(vartype: &NcVariableType) -> String {
    match vartype {
        NcVariableType::Float(FloatType::F64) => "f64".into(),
        NcVariableType::Float(FloatType::F32) => "f32".into(),
        NcVariableType::Int(IntType::I64) => "i64".into(),
        NcVariableType::Int(IntType::I32) => "i32".into(),
        NcVariableType::Int(IntType::I16) => "i16".into(),
        NcVariableType::Int(IntType::I8) => "i8".into(),
        NcVariableType::Int(IntType::U64) => "u64".into(),
        NcVariableType::Int(IntType::U32) => "u32".into(),
        NcVariableType::Int(IntType::U16) => "u16".into(),
        NcVariableType::Int(IntType::U8) => "u8".into(),
        NcVariableType::Char => "char".into(),
        NcVariableType::String => "string".into(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// Read every value of `var` as `f64`, shaped as `shape`.
pub(super) fn read_variable_array(var: &netcdf::Variable<'_>, shape: &[usize]) -> Result<ArrayD<f64>> {
    let vartype = var.vartype();

    let from_vec = |v: Vec<f64>| -> Result<ArrayD<f64>> {
        ArrayD::from_shape_vec(IxDyn(shape), v)
            .map_err(|e| CoronaError::NetCDF(format!("Invalid shape/data size: {}", e)))
    };
    let read_err = |e: netcdf::Error| {
        CoronaError::NetCDF(format!("Failed to read {} data: {}", dtype_name(&vartype), e))
    };

    match &vartype {
        NcVariableType::Float(FloatType::F64) => {
            let values: Vec<f64> = var.get_values(..).map_err(read_err)?;
            from_vec(values)
        }
        NcVariableType::Float(FloatType::F32) => {
            let values: Vec<f32> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(f64::from).collect())
        }
        NcVariableType::Int(IntType::I64) => {
            let values: Vec<i64> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(|x| x as f64).collect())
        }
        NcVariableType::Int(IntType::I32) => {
            let values: Vec<i32> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(f64::from).collect())
        }
        NcVariableType::Int(IntType::I16) => {
            let values: Vec<i16> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(f64::from).collect())
        }
        NcVariableType::Int(IntType::I8) => {
            let values: Vec<i8> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(f64::from).collect())
        }
        NcVariableType::Int(IntType::U64) => {
            let values: Vec<u64> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(|x| x as f64).collect())
        }
        NcVariableType::Int(IntType::U32) => {
            let values: Vec<u32> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(f64::from).collect())
        }
        NcVariableType::Int(IntType::U16) => {
            let values: Vec<u16> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(f64::from).collect())
        }
        NcVariableType::Int(IntType::U8) => {
            let values: Vec<u8> = var.get_values(..).map_err(read_err)?;
            from_vec(values.into_iter().map(f64::from).collect())
        }
        NcVariableType::Char | NcVariableType::String => Err(CoronaError::invalid(
            "character/string data cannot be rendered as an image",
        )),
        _ => Err(CoronaError::NetCDF(format!(
            "Unsupported variable type: {:?}",
            vartype
        ))),
    }
}

/// Numeric attribute of `var`, if present and convertible.
fn f64_attr(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    // Check first so HDF5 does not log a lookup failure for absent attributes
    if !var.attributes().any(|attr| attr.name() == name) {
        return None;
    }
    let value = var.attribute_value(name)?.ok()?;
    f64::try_from(value).ok()
}

/// Apply CF conventions in place: fill and missing values become NaN, then
/// `v * scale_factor + add_offset`.
pub(super) fn decode_cf(var: &netcdf::Variable<'_>, data: &mut ArrayD<f64>) {
    let fill = f64_attr(var, "_FillValue");
    let missing = f64_attr(var, "missing_value");
    if fill.is_some() || missing.is_some() {
        data.mapv_inplace(|v| {
            if Some(v) == fill || Some(v) == missing {
                f64::NAN
            } else {
                v
            }
        });
    }

    let scale_factor = f64_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = f64_attr(var, "add_offset").unwrap_or(0.0);
    if scale_factor != 1.0 || add_offset != 0.0 {
        data.mapv_inplace(|v| v * scale_factor + add_offset);
    }
}
