use std::fs;

use approx::assert_relative_eq;
use simmesh::{
    save_mesh_auto, BoundingBox, GeometricAnalysis, MeshModel, OutputFormat, VTPWriter, VtpParser,
};

/// Two tetrahedra sharing a face, one unused point, coordinates slightly off the unit box.
fn noisy_mesh() -> MeshModel {
    let points = vec![
        vec![1e-7, 0.0, 0.0],
        vec![0.9999995, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![5.0, 5.0, 5.0], // unused
        vec![0.0, 0.0, 1.0000004],
        vec![1.0, 1.0, 1.0],
    ];
    let mut mesh = MeshModel::from_arrays(&points, &[vec![0, 1, 2, 4], vec![1, 2, 4, 5]]).unwrap();
    mesh.add_point_data("pressure", vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    mesh.add_cell_data("subdomain", vec![1.0, 2.0]).unwrap();
    mesh.add_cell_data("porosity", vec![0.35, 0.4]).unwrap();
    mesh
}

#[test]
fn vtp_to_msh_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let vtp = dir.path().join("input.vtp");
    VTPWriter::write_vtp(&noisy_mesh(), &vtp).unwrap();

    let mut mesh = VtpParser::parse_file(&vtp).unwrap();
    let report = mesh.rebuild().unwrap();
    assert_eq!(report.removed, vec![3]);
    assert_eq!(mesh.connectivity(), &[0, 1, 2, 3, 1, 2, 3, 4]);
    assert_eq!(mesh.point_data()[0].values, vec![0.0, 1.0, 2.0, 4.0, 5.0]);

    mesh.snap_to_box(&BoundingBox::from_array([0.0, 0.0, 0.0, 1.0, 1.0, 1.0]), 1e-6);
    assert_eq!(mesh.points()[0], [0.0, 0.0, 0.0]);
    assert_eq!(mesh.points()[1], [1.0, 0.0, 0.0]);
    assert_eq!(mesh.points()[3], [0.0, 0.0, 1.0]);

    let quality = GeometricAnalysis::analyse_mesh_quality(&mesh).unwrap();
    assert_relative_eq!(quality.element_qualities[0], 0.5);
    assert!(quality.statistics.min <= quality.statistics.mean);
    assert!(quality.statistics.mean <= quality.statistics.max);

    let msh = dir.path().join("input.msh");
    save_mesh_auto(&mesh, &msh).unwrap();
    let text = fs::read_to_string(&msh).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    let nodes_at = lines.iter().position(|l| *l == "$Nodes").unwrap();
    assert_eq!(lines[nodes_at + 1], "5");
    assert_eq!(lines[nodes_at + 2], "1 0.000000 0.000000 0.000000");

    let elements_at = lines.iter().position(|l| *l == "$Elements").unwrap();
    assert_eq!(lines[elements_at + 1], "10");
    assert_eq!(lines[elements_at + 10], "9 4 2 1 0.35 1 2 3 4");
    assert_eq!(lines[elements_at + 11], "10 4 2 2 0.4 2 3 4 5");
    assert_eq!(lines[elements_at + 12], "$EndElements");
}

#[test]
fn dgf_and_rsml_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut mesh = noisy_mesh();
    mesh.rebuild().unwrap();

    let dgf = dir.path().join("grid.dgf");
    save_mesh_auto(&mesh, &dgf).unwrap();
    let text = fs::read_to_string(&dgf).unwrap();
    assert!(text.starts_with("DGF\nVertex\nparameters 1\n"));
    assert!(text.contains("Simplex\nparameters 2\n0 1 2 3 1 0.35 \n#\n"));
    assert!(text.contains("BOUNDARYSEGMENTS\n2 0\n3 4\n#\n"));

    // RSML needs segments; a tetrahedral mesh is refused and leaves nothing behind.
    let rsml = dir.path().join("grid.rsml");
    assert!(save_mesh_auto(&mesh, &rsml).is_err());
    assert!(!rsml.exists());

    let root = MeshModel::from_arrays(
        &[vec![0.0, 0.0, 0.0], vec![0.0, 0.0, -1.0], vec![0.0, 0.0, -2.0]],
        &[vec![0, 1], vec![1, 2]],
    )
    .unwrap();
    save_mesh_auto(&root, &rsml).unwrap();
    let xml = fs::read_to_string(&rsml).unwrap();
    assert_eq!(xml.matches("<point ").count(), 3);
}

#[test]
fn format_detection_covers_every_writer() {
    for format in [
        OutputFormat::Msh,
        OutputFormat::Dgf,
        OutputFormat::Vtp,
        OutputFormat::Vtu,
        OutputFormat::Rsml,
    ] {
        let name = format!("mesh.{}", format.extension());
        assert_eq!(OutputFormat::from_path(&name), Some(format));
    }
}
