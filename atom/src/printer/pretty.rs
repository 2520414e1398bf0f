use pretty::DocAllocator as _;

use super::{check_name, check_real, check_text, Print, Printer, SaveError};

/// A pretty printer that uses the `pretty` crate to format the output.
struct PrettyPrinter<'a, C> {
    arena: &'a pretty::Arena<'a>,
    items: Vec<pretty::DocBuilder<'a, pretty::Arena<'a>>>,
    context: C,
}

impl<'a, C> Printer<C> for PrettyPrinter<'a, C> {
    type Error = SaveError;

    fn name(&mut self, name: &str) -> Result<(), Self::Error> {
        check_name(name)?;
        self.items.push(self.arena.text(name.to_string()));
        Ok(())
    }

    fn long(&mut self, value: i64) -> Result<(), Self::Error> {
        self.items.push(self.arena.text(value.to_string()));
        Ok(())
    }

    fn real(&mut self, value: f64) -> Result<(), Self::Error> {
        check_real(value)?;
        self.items.push(self.arena.text(format!("{:.6}", value)));
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Self::Error> {
        check_text(text)?;
        self.items.push(self.arena.text(format!("\"{}\"", text)));
        Ok(())
    }

    fn list<F>(&mut self, f: F) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>,
    {
        let position = self.items.len();
        f(self)?;
        let items = self.items.drain(position..);

        let docs = self
            .arena
            .intersperse(items, self.arena.line())
            .nest(2)
            .group();

        self.items.push(
            self.arena
                .text("(")
                .append(docs)
                .append(self.arena.text(")")),
        );

        Ok(())
    }

    #[inline]
    fn context(&self) -> &C {
        &self.context
    }
}

/// Pretty print a `T` with a given context.
///
/// Lists that do not fit into `width` columns put each item on its own line,
/// indented by two spaces. Top-level forms are separated by a blank line.
pub fn to_string_pretty<T: Print<C>, C>(
    value: T,
    width: usize,
    context: C,
) -> Result<String, SaveError> {
    let arena = pretty::Arena::new();
    let mut printer = PrettyPrinter {
        items: vec![],
        arena: &arena,
        context,
    };

    value.print(&mut printer)?;

    let double_line = arena.line().append(arena.line());
    let doc = arena.intersperse(printer.items, double_line);

    let mut string = String::new();
    let _ = doc.render_fmt(width, &mut string);
    Ok(string)
}
