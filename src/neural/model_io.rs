//! Weight persistence using the safetensors format.
//!
//! Safetensors files carry tensor names and shapes, so a fresh process can
//! rebuild the network from the file alone; they are also stable across
//! libtorch versions, unlike PyTorch's native serialization.

use safetensors::serialize_to_file;
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tch::{nn, Tensor};

use crate::{Result, RpsError};

/// Saves every variable of `vs` into a safetensors file at `path`.
pub fn save_varstore(vs: &nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let mut buffers: HashMap<String, (Vec<usize>, Vec<u8>)> = HashMap::new();

    for (name, tensor) in vs.variables() {
        let shape: Vec<usize> = tensor.size().iter().map(|&d| d as usize).collect();
        let flat = tensor
            .to_device(tch::Device::Cpu)
            .to_kind(tch::Kind::Float)
            .flatten(0, -1)
            .contiguous();
        let data: Vec<f32> =
            Vec::<f32>::try_from(&flat).map_err(|e| RpsError::Model(e.to_string()))?;
        let bytes: Vec<u8> = data.iter().flat_map(|x| x.to_le_bytes()).collect();
        buffers.insert(name, (shape, bytes));
    }

    let views: HashMap<String, TensorView<'_>> = buffers
        .iter()
        .map(|(name, (shape, bytes))| {
            let view = TensorView::new(Dtype::F32, shape.clone(), bytes)
                .expect("tensor byte length matches its shape");
            (name.clone(), view)
        })
        .collect();

    serialize_to_file(views, &None, path.as_ref())
        .map_err(|e| RpsError::Model(e.to_string()))?;
    Ok(())
}

/// Loads a safetensors file into an already-shaped `vs`.
///
/// Every variable of `vs` must be present in the file with a matching shape.
pub fn load_varstore(vs: &mut nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let buffer = fs::read(path.as_ref())?;
    let tensors =
        SafeTensors::deserialize(&buffer).map_err(|e| RpsError::Model(e.to_string()))?;

    for (name, mut var) in vs.variables() {
        let view = tensors
            .tensor(&name)
            .map_err(|e| RpsError::Model(format!("missing tensor '{}': {}", name, e)))?;
        let loaded = view_to_tensor(&view)?;
        if loaded.size() != var.size() {
            return Err(RpsError::Model(format!(
                "tensor '{}' has shape {:?}, expected {:?}",
                name,
                loaded.size(),
                var.size()
            )));
        }
        tch::no_grad(|| {
            var.copy_(&loaded);
        });
    }
    Ok(())
}

/// Reads the stored shape of one tensor without building a network, used to
/// recover the hidden width from a checkpoint.
pub fn stored_shape(path: impl AsRef<Path>, name: &str) -> Result<Vec<usize>> {
    let buffer = fs::read(path.as_ref())?;
    let tensors =
        SafeTensors::deserialize(&buffer).map_err(|e| RpsError::Model(e.to_string()))?;
    let view = tensors
        .tensor(name)
        .map_err(|e| RpsError::Model(format!("missing tensor '{}': {}", name, e)))?;
    Ok(view.shape().to_vec())
}

fn view_to_tensor(view: &TensorView) -> Result<Tensor> {
    if view.dtype() != Dtype::F32 {
        return Err(RpsError::Model(format!(
            "unsupported dtype {:?}, expected F32",
            view.dtype()
        )));
    }
    let shape: Vec<i64> = view.shape().iter().map(|&d| d as i64).collect();
    let floats: Vec<f32> = view
        .data()
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Ok(Tensor::from_slice(&floats).reshape(&shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.safetensors");

        let vs1 = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(&vs1.root() / "fc1", 10, 5, Default::default());
        save_varstore(&vs1, &path).unwrap();

        let mut vs2 = nn::VarStore::new(Device::Cpu);
        let _layer2 = nn::linear(&vs2.root() / "fc1", 10, 5, Default::default());
        load_varstore(&mut vs2, &path).unwrap();

        for (name, t1) in vs1.variables() {
            let vars = vs2.variables();
            let t2 = vars.get(&name).unwrap();
            assert!(t1.allclose(t2, 1e-6, 1e-6, false), "mismatch in {}", name);
        }
    }

    #[test]
    fn test_stored_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.safetensors");

        let vs = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(&vs.root() / "fc1", 81, 32, Default::default());
        save_varstore(&vs, &path).unwrap();

        assert_eq!(stored_shape(&path, "fc1.weight").unwrap(), vec![32, 81]);
    }

    #[test]
    fn test_load_rejects_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.safetensors");

        let vs = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(&vs.root() / "fc1", 10, 5, Default::default());
        save_varstore(&vs, &path).unwrap();

        let mut other = nn::VarStore::new(Device::Cpu);
        let _wider = nn::linear(&other.root() / "fc1", 10, 6, Default::default());
        assert!(load_varstore(&mut other, &path).is_err());
    }
}
