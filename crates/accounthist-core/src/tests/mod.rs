mod cursor;
mod facet;
