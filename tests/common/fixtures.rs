/// A namespaced TEI document with one of each common entity.
pub const TEI_DOCUMENT: &str = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader><fileDesc><title>Letters</title></fileDesc></teiHeader>
  <text>
    <body>
      <p xml:lang="en"><persName ref="#p1" cert="high" annotationId="ann1" cwrcStructId="s1">Alice</persName>
        met <placeName ref="#pl1">Paris</placeName> on
        <date when="1901-05-02">2 May</date>.<note type="researchNote" annotationId="n1"><p>Seen <hi>twice</hi></p></note><note type="citation"><bibl><ref target="http://example.org/b1">Smith</ref></bibl></note></p>
    </body>
  </text>
</TEI>"##;

/// The same kind of content in the namespace-less Orlando dialect.
pub const ORLANDO_DOCUMENT: &str = r##"<ENTRY>
  <DIV0><P><NAME STANDARD="Woolf, Virginia" REF="http://viaf.org/1">Virginia</NAME>
    was born in <PLACE REF="http://geonames.org/2">London</PLACE>.
    <RESEARCHNOTE><P>Check the date.</P></RESEARCHNOTE></P></DIV0>
</ENTRY>"##;
