//! NetCDF stack reader.

use std::path::Path;

use ndarray::{Array3, Axis, Ix2, Ix3};
use tracing::{debug, info};

use super::variable_data::{decode_cf, dtype_name, read_variable_array};
use crate::error::{CoronaError, Result};
use crate::normalize::ImageStack;

/// Shape and type of one variable in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    /// Variable name.
    pub name: String,
    /// Dimension lengths, outermost first.
    pub shape: Vec<usize>,
    /// Dimension names, parallel to `shape`.
    pub dim_names: Vec<String>,
    /// Storage type (`f32`, `i16`, ...).
    pub dtype: String,
}

impl VariableInfo {
    /// Whether the variable can be read as an image stack.
    pub fn is_image(&self) -> bool {
        matches!(self.shape.len(), 2 | 3) && self.dtype != "char" && self.dtype != "string"
    }
}

fn open(path: &Path) -> Result<netcdf::File> {
    if !path.exists() {
        return Err(CoronaError::file_open(
            path.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        ));
    }
    netcdf::open(path).map_err(|e| CoronaError::NetCDF(format!("Failed to open file: {}", e)))
}

/// Describe every root-level variable of a NetCDF file.
pub fn list_variables(path: &Path) -> Result<Vec<VariableInfo>> {
    let file = open(path)?;
    let vars: Vec<VariableInfo> = file
        .variables()
        .map(|var| VariableInfo {
            name: var.name(),
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
            dim_names: var.dimensions().iter().map(|d| d.name()).collect(),
            dtype: dtype_name(&var.vartype()),
        })
        .collect();
    debug!(path = %path.display(), count = vars.len(), "listed variables");
    Ok(vars)
}

/// Read a 2-D or 3-D numeric variable as an image stack.
///
/// A 3-D variable is laid out `(frame, y, x)`; a 2-D variable becomes a
/// single frame. Fill values become NaN and CF `scale_factor` /
/// `add_offset` are applied.
pub fn read_stack(path: &Path, variable: &str) -> Result<ImageStack> {
    let file = open(path)?;
    let name = variable.trim_start_matches('/');
    let var = file
        .variable(name)
        .ok_or_else(|| CoronaError::NetCDF(format!("Variable '{}' not found", name)))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if !matches!(shape.len(), 2 | 3) {
        return Err(CoronaError::invalid(format!(
            "variable '{}' has {} dimensions, expected 2 or 3",
            name,
            shape.len()
        )));
    }

    let mut data = read_variable_array(&var, &shape)?;
    decode_cf(&var, &mut data);

    let data: Array3<f64> = if shape.len() == 2 {
        data.into_dimensionality::<Ix2>()
            .map_err(|e| CoronaError::NetCDF(format!("Invalid shape/data size: {}", e)))?
            .insert_axis(Axis(0))
    } else {
        data.into_dimensionality::<Ix3>()
            .map_err(|e| CoronaError::NetCDF(format!("Invalid shape/data size: {}", e)))?
    };

    let stack = ImageStack::new(data)?;
    info!(
        path = %path.display(),
        variable = name,
        frames = stack.frames(),
        height = stack.height(),
        width = stack.width(),
        "read image stack"
    );
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("stack.nc");
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("frame", 2).unwrap();
        file.add_dimension("y", 3).unwrap();
        file.add_dimension("x", 4).unwrap();
        file.add_dimension("n", 5).unwrap();

        let cube: Vec<f64> = (0..24).map(|i| i as f64).collect();
        let mut var = file.add_variable::<f64>("img", &["frame", "y", "x"]).unwrap();
        var.put_values(&cube, ..).unwrap();

        let counts: Vec<i16> = (0..12).map(|i| if i == 5 { -1 } else { i }).collect();
        let mut var = file.add_variable::<i16>("counts", &["y", "x"]).unwrap();
        var.put_attribute("scale_factor", 0.5f64).unwrap();
        var.put_attribute("add_offset", 10.0f64).unwrap();
        var.put_attribute("_FillValue", -1i16).unwrap();
        var.put_values(&counts, ..).unwrap();

        let line: Vec<f32> = vec![1.0; 5];
        let mut var = file.add_variable::<f32>("line", &["n"]).unwrap();
        var.put_values(&line, ..).unwrap();
        path
    }

    #[test]
    fn reads_cube() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);
        let stack = read_stack(&path, "img").unwrap();
        assert_eq!(stack.dim(), (2, 3, 4));
        assert_eq!(stack.data()[[1, 2, 3]], 23.0);
    }

    #[test]
    fn plane_becomes_one_frame_with_cf_decoding() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);
        let stack = read_stack(&path, "counts").unwrap();
        assert_eq!(stack.dim(), (1, 3, 4));
        let frame = stack.frame(0).unwrap();
        assert_eq!(frame[[0, 0]], 10.0);
        assert_eq!(frame[[0, 2]], 11.0);
        assert!(frame[[1, 1]].is_nan());
    }

    #[test]
    fn rejects_wrong_rank_and_missing_variable() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);
        assert!(read_stack(&path, "line").unwrap_err().is_invalid_argument());
        assert!(matches!(
            read_stack(&path, "nope").unwrap_err(),
            CoronaError::NetCDF(_)
        ));
    }

    #[test]
    fn missing_file_is_file_open() {
        let err = read_stack(Path::new("/definitely/not/here.nc"), "img").unwrap_err();
        assert!(matches!(err, CoronaError::FileOpen { .. }));
    }

    #[test]
    fn lists_variables() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir);
        let vars = list_variables(&path).unwrap();
        let img = vars.iter().find(|v| v.name == "img").unwrap();
        assert_eq!(img.shape, vec![2, 3, 4]);
        assert_eq!(img.dim_names, vec!["frame", "y", "x"]);
        assert_eq!(img.dtype, "f64");
        assert!(img.is_image());
        let line = vars.iter().find(|v| v.name == "line").unwrap();
        assert!(!line.is_image());
    }
}
