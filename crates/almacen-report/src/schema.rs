//! # Column Schemas
//!
//! A schema is an ordered list of `{header, width, formatter}` columns for
//! one canonical entity. Rendering a schema over rows yields a [`Table`] of
//! display strings, which is all the layouts ever see.
//!
//! Widths are relative weights; each layout scales them to its own unit.

use almacen_core::{Category, Client, Product, Sale, Supplier};

use crate::error::{ReportError, ReportResult};
use crate::format;

/// One report column.
pub struct Column<T> {
    pub header: &'static str,
    /// Relative width weight.
    pub width: f32,
    pub format: fn(&T) -> String,
}

impl<T> Column<T> {
    pub fn new(header: &'static str, width: f32, format: fn(&T) -> String) -> Self {
        Column { header, width, format }
    }
}

/// Columns for one collection, plus the report title.
pub struct Schema<T> {
    /// Collection name used in file names (`productos-2024-03-05.pdf`).
    pub entity: &'static str,
    pub title: &'static str,
    pub columns: Vec<Column<T>>,
}

impl<T> Schema<T> {
    /// Formats every row with every column.
    pub fn render(&self, rows: &[T]) -> ReportResult<Table> {
        if self.columns.is_empty() {
            return Err(ReportError::EmptySchema(self.entity.to_string()));
        }

        Ok(Table {
            title: self.title.to_string(),
            headers: self.columns.iter().map(|c| c.header.to_string()).collect(),
            weights: self.columns.iter().map(|c| c.width.max(0.1)).collect(),
            rows: rows
                .iter()
                .map(|row| self.columns.iter().map(|c| (c.format)(row)).collect())
                .collect(),
        })
    }
}

/// Display strings ready for layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub weights: Vec<f32>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Checks that every row has one cell per column.
    pub fn check(&self) -> ReportResult<()> {
        if self.headers.is_empty() {
            return Err(ReportError::EmptySchema(self.title.clone()));
        }
        for (row, cells) in self.rows.iter().enumerate() {
            if cells.len() != self.headers.len() {
                return Err(ReportError::RaggedRow {
                    row,
                    found: cells.len(),
                    expected: self.headers.len(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Predefined Schemas
// =============================================================================

pub fn categories() -> Schema<Category> {
    Schema {
        entity: "categorias",
        title: "Reporte de Categorías",
        columns: vec![
            Column::new("ID", 1.0, |c: &Category| c.id.clone()),
            Column::new("Nombre", 2.0, |c: &Category| format::text(&c.name)),
            Column::new("Descripción", 4.0, |c: &Category| format::text(&c.description)),
            Column::new("Estado", 1.0, |c: &Category| c.status_label().to_string()),
        ],
    }
}

pub fn clients() -> Schema<Client> {
    Schema {
        entity: "clientes",
        title: "Reporte de Clientes",
        columns: vec![
            Column::new("ID", 0.8, |c: &Client| c.id.clone()),
            Column::new("Nombre", 2.5, |c: &Client| format::text(&c.name)),
            Column::new("Tipo Doc.", 1.0, |c: &Client| format::text(&c.document_type)),
            Column::new("Documento", 1.5, |c: &Client| format::text(&c.document_number)),
            Column::new("Correo", 2.5, |c: &Client| format::opt_text(c.email.as_deref())),
            Column::new("Teléfono", 1.5, |c: &Client| format::opt_text(c.phone.as_deref())),
            Column::new("Estado", 1.0, |c: &Client| c.status_label().to_string()),
            Column::new("Registro", 1.2, |c: &Client| format::date(c.created_at)),
        ],
    }
}

pub fn suppliers() -> Schema<Supplier> {
    Schema {
        entity: "proveedores",
        title: "Reporte de Proveedores",
        columns: vec![
            Column::new("NIT", 1.5, |s: &Supplier| format::text(&s.tax_id)),
            Column::new("Nombre", 2.5, |s: &Supplier| format::text(&s.name)),
            Column::new("Contacto", 1.8, |s: &Supplier| format::opt_text(s.contact.as_deref())),
            Column::new("Teléfono", 1.3, |s: &Supplier| format::opt_text(s.phone.as_deref())),
            Column::new("Correo", 2.2, |s: &Supplier| format::opt_text(s.email.as_deref())),
            Column::new("Categorías", 2.5, |s: &Supplier| s.categories_display()),
            Column::new("Estado", 1.0, |s: &Supplier| s.status_label().to_string()),
        ],
    }
}

pub fn products() -> Schema<Product> {
    Schema {
        entity: "productos",
        title: "Reporte de Productos",
        columns: vec![
            Column::new("ID", 0.8, |p: &Product| p.id.clone()),
            Column::new("Producto", 2.5, |p: &Product| format::text(&p.name)),
            Column::new("Categoría", 1.5, |p: &Product| p.category_display().to_string()),
            Column::new("Proveedores", 2.2, |p: &Product| p.providers_display()),
            Column::new("Stock", 0.8, |p: &Product| p.stock_current.to_string()),
            Column::new("Mín.", 0.7, |p: &Product| p.stock_min.to_string()),
            Column::new("Máx.", 0.7, |p: &Product| p.stock_max.to_string()),
            Column::new("Costo", 1.3, |p: &Product| format::currency(p.unit_cost)),
            Column::new("Precio", 1.3, |p: &Product| format::currency(p.sale_price)),
            Column::new("Actualizado", 1.2, |p: &Product| format::date(p.updated_at)),
        ],
    }
}

pub fn sales() -> Schema<Sale> {
    Schema {
        entity: "ventas",
        title: "Reporte de Ventas",
        columns: vec![
            Column::new("ID", 0.8, |s: &Sale| s.id.clone()),
            Column::new("Fecha", 1.2, |s: &Sale| format::date(s.date)),
            Column::new("Cliente", 2.2, |s: &Sale| format::text(&s.client.name)),
            Column::new("Productos", 3.0, |s: &Sale| {
                almacen_core::join_names(s.lines.iter().map(|l| l.name.as_str()))
            }),
            Column::new("Pago", 1.2, |s: &Sale| s.payment_method.label().to_string()),
            Column::new("Estado", 1.1, |s: &Sale| s.status.label().to_string()),
            Column::new("Total", 1.3, |s: &Sale| format::currency(s.total)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almacen_core::{CategoryRef, Money};

    fn product() -> Product {
        Product {
            id: "10".into(),
            name: "Arroz".into(),
            category: CategoryRef::default(),
            providers: Vec::new(),
            stock_current: 3,
            stock_min: 1,
            stock_max: 9,
            unit_cost: Money::from_cents(120_000),
            sale_price: Money::from_cents(150_050),
            updated_at: None,
        }
    }

    #[test]
    fn test_products_schema_renders_defaults() {
        let table = products().render(&[product()]).unwrap();
        assert_eq!(table.column_count(), 10);
        assert_eq!(
            table.rows[0],
            vec!["10", "Arroz", "N/A", "N/A", "3", "1", "9", "$ 1.200", "$ 1.500,50", "N/A"]
        );
        assert!(table.check().is_ok());
    }

    #[test]
    fn test_empty_schema_is_an_error() {
        let schema: Schema<Product> = Schema {
            entity: "vacio",
            title: "Vacío",
            columns: Vec::new(),
        };
        assert!(matches!(schema.render(&[]), Err(ReportError::EmptySchema(_))));
    }

    #[test]
    fn test_ragged_table_is_rejected() {
        let table = Table {
            title: "t".into(),
            headers: vec!["a".into(), "b".into()],
            weights: vec![1.0, 1.0],
            rows: vec![vec!["x".into()]],
        };
        assert!(matches!(table.check(), Err(ReportError::RaggedRow { row: 0, found: 1, expected: 2 })));
    }
}
