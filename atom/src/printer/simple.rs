use std::fmt::Write as _;

use super::{check_name, check_real, check_text, Print, Printer, SaveError};

/// A printer that writes everything on one line.
struct SimplePrinter<C> {
    needs_whitespace: bool,
    string: String,
    context: C,
}

impl<C> SimplePrinter<C> {
    pub fn new(context: C) -> Self {
        Self {
            needs_whitespace: false,
            string: String::new(),
            context,
        }
    }

    #[inline]
    fn separate(&mut self) {
        if self.needs_whitespace {
            self.string.push(' ');
        }
        self.needs_whitespace = true;
    }
}

impl<C> Printer<C> for SimplePrinter<C> {
    type Error = SaveError;

    fn name(&mut self, name: &str) -> Result<(), Self::Error> {
        check_name(name)?;
        self.separate();
        self.string.push_str(name);
        Ok(())
    }

    fn long(&mut self, value: i64) -> Result<(), Self::Error> {
        self.separate();
        let _ = write!(&mut self.string, "{}", value);
        Ok(())
    }

    fn real(&mut self, value: f64) -> Result<(), Self::Error> {
        check_real(value)?;
        self.separate();
        let _ = write!(&mut self.string, "{:.6}", value);
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Self::Error> {
        check_text(text)?;
        self.separate();
        self.string.push('"');
        self.string.push_str(text);
        self.string.push('"');
        Ok(())
    }

    fn list<F>(&mut self, f: F) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>,
    {
        self.separate();
        self.string.push('(');
        self.needs_whitespace = false;
        f(self)?;
        self.string.push(')');
        self.needs_whitespace = true;
        Ok(())
    }

    #[inline]
    fn context(&self) -> &C {
        &self.context
    }
}

/// Print a `T` on a single line.
///
/// This function does not produce any line breaks or indentation. Where human
/// readability is a concern, consider using the [`to_string_pretty`] function
/// instead.
///
/// The `context` is handed to the `Print` implementation. Node trees expect a
/// [`Resolve`] implementation here; owned values accept anything, so `()` will do.
///
/// [`to_string_pretty`]: `crate::printer::to_string_pretty`
/// [`Resolve`]: `crate::node::Resolve`
pub fn to_string<T: Print<C>, C>(value: T, context: C) -> Result<String, SaveError> {
    let mut printer = SimplePrinter::new(context);
    value.print(&mut printer)?;
    Ok(printer.string)
}
