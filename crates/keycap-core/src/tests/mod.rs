mod lists;
mod markup;
