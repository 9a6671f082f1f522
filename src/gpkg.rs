//! The `gpkg_spatial_ref_sys` table of a GeoPackage and conversion of its
//! records into [`SpatialReference`] values.

use crate::result::{Error, Result};
use crate::srs::SpatialReference;
use rusqlite::{params, Connection, OptionalExtension};

/// Represents a spatial reference system as it appears in the GeoPackage [specification](https://www.geopackage.org/spec130/#gpkg_spatial_ref_sys_cols)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialRefSys<'a> {
    pub name: &'a str,
    pub id: i64,
    pub organization: &'a str,
    pub organization_coordsys_id: i64,
    pub definition: &'a str,
    pub description: &'a str,
}

/// An owned row read back from `gpkg_spatial_ref_sys`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRefSysRow {
    pub name: String,
    pub id: i64,
    pub organization: String,
    pub organization_coordsys_id: i64,
    pub definition: String,
    pub description: String,
}

impl SpatialRefSysRow {
    pub fn as_spatial_ref_sys(&self) -> SpatialRefSys<'_> {
        SpatialRefSys {
            name: &self.name,
            id: self.id,
            organization: &self.organization,
            organization_coordsys_id: self.organization_coordsys_id,
            definition: &self.definition,
            description: &self.description,
        }
    }
}

/// The records every GeoPackage must contain.
pub mod defaults {
    use super::SpatialRefSys;
    pub const WGS84: SpatialRefSys = SpatialRefSys {
        name: "WGS 84 geodetic",
        id: 4326,
        organization: "EPSG",
        organization_coordsys_id: 4326,
        definition: "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4326\"]]",
        description: "longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid",
    };
    pub const GEOGRAPHIC: SpatialRefSys = SpatialRefSys {
        name: "undefined geographic SRS",
        id: 0,
        organization: "NONE",
        organization_coordsys_id: 0,
        definition: "undefined",
        description: "undefined geographic coordinate reference system",
    };
    pub const CARTESIAN: SpatialRefSys = SpatialRefSys {
        name: "undefined cartesian SRS",
        id: -1,
        organization: "NONE",
        organization_coordsys_id: -1,
        definition: "undefined",
        description: "undefined cartesian coordinate reference system",
    };
}

pub const CREATE_SPATIAL_REF_SYS_TABLE: &str = "CREATE TABLE gpkg_spatial_ref_sys (
        srs_name TEXT NOT NULL,
        srs_id INTEGER NOT NULL PRIMARY KEY,
        organization TEXT NOT NULL,
        organization_coordsys_id INTEGER NOT NULL,
        definition TEXT NOT NULL,
        description TEXT NOT NULL
    )";

/// Create `gpkg_spatial_ref_sys` and insert the three mandatory records.
pub fn create_spatial_ref_sys_table(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_SPATIAL_REF_SYS_TABLE, [])?;
    insert_spatial_ref_sys(conn, &defaults::WGS84)?;
    insert_spatial_ref_sys(conn, &defaults::CARTESIAN)?;
    insert_spatial_ref_sys(conn, &defaults::GEOGRAPHIC)?;
    Ok(())
}

pub fn insert_spatial_ref_sys(conn: &Connection, srs: &SpatialRefSys) -> Result<()> {
    const STMT: &str = "INSERT INTO gpkg_spatial_ref_sys VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
    conn.execute(
        STMT,
        params![
            srs.name,
            srs.id,
            srs.organization,
            srs.organization_coordsys_id,
            srs.definition,
            srs.description,
        ],
    )?;
    Ok(())
}

pub fn load_spatial_ref_sys(conn: &Connection, srs_id: i64) -> Result<SpatialRefSysRow> {
    const STMT: &str = "SELECT srs_name, srs_id, organization, organization_coordsys_id, definition, description
        FROM gpkg_spatial_ref_sys WHERE srs_id = ?1";
    let row = conn
        .query_row(STMT, params![srs_id], |row| {
            Ok(SpatialRefSysRow {
                name: row.get(0)?,
                id: row.get(1)?,
                organization: row.get(2)?,
                organization_coordsys_id: row.get(3)?,
                definition: row.get(4)?,
                description: row.get(5)?,
            })
        })
        .optional()?;
    row.ok_or(Error::UnknownSrsId(srs_id))
}

impl SpatialReference {
    /// Build a spatial reference from a `gpkg_spatial_ref_sys` record.
    ///
    /// The `definition` column is used when it holds one. Records whose
    /// definition is `undefined` fall back to `<organization>:<code>`, except
    /// for organization `NONE`, which has nothing to fall back to.
    pub fn from_spatial_ref_sys(srs: &SpatialRefSys) -> Result<SpatialReference> {
        let definition = srs.definition.trim();
        if !definition.is_empty() && !definition.eq_ignore_ascii_case("undefined") {
            return SpatialReference::create(definition);
        }
        if srs.organization.eq_ignore_ascii_case("none") {
            tracing::debug!(srs_id = srs.id, name = srs.name, "spatial reference system is undefined");
            return Err(Error::UndefinedSrs(srs.id));
        }
        SpatialReference::create(&format!(
            "{}:{}",
            srs.organization, srs.organization_coordsys_id
        ))
    }

    /// Look up `srs_id` in the GeoPackage behind `conn`.
    pub fn from_gpkg(conn: &Connection, srs_id: i64) -> Result<SpatialReference> {
        let row = load_spatial_ref_sys(conn, srs_id)?;
        SpatialReference::from_spatial_ref_sys(&row.as_spatial_ref_sys())
    }
}
